//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};
#[cfg(feature = "lame")]
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use walkdir::WalkDir;

use crate::config::SpliceConfig;
use crate::engine::{
    calculate_peak, decode_audio, media_type_for_extension, write_artifact, AudioSource,
    OutputFormat, SegmentBound,
};
use crate::session::{CutterSession, JoinerSession};

/// Cut `segments` out of `input` and write `cut-<name>.wav` into `output_dir`.
pub fn cut(
    input: &Path,
    segments: &[(f64, f64)],
    output_dir: &Path,
    config: &SpliceConfig,
) -> Result<PathBuf> {
    info!("Cutting {} segments from {}", segments.len(), input.display());

    let source = AudioSource::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut session = CutterSession::new(config.clone());
    let duration = session
        .load(&source)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    // Each add only checks segments already placed, so go in start order
    let mut ordered = segments.to_vec();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

    for &(start, end) in &ordered {
        let index = session.add_segment_at_time(start).with_context(|| {
            format!(
                "Cannot add segment at {:.3}s (audio is {:.3}s)",
                start, duration
            )
        })?;
        session
            .update_segment_bound(index, SegmentBound::End, end)
            .with_context(|| format!("Cannot end segment at {:.3}s", end))?;

        // Edits clamp to the audio and the minimum length; refuse to cut
        // anything other than what was asked for
        let applied = *session.segments().get(index)?;
        if (applied.start() - start).abs() > 1e-9 || (applied.end() - end).abs() > 1e-9 {
            bail!(
                "Segment {:.3}:{:.3} cannot be cut as given (audio is {:.3}s, got {})",
                start,
                end,
                duration,
                applied
            );
        }
    }

    let handle = session.process().context("Cut failed")?;
    let artifact = session.artifacts().get(handle)?;
    let path = write_artifact(artifact, output_dir)?;

    println!(
        "Cut {} segments ({:.3}s) -> {}",
        session.segments().len(),
        session.segments().total_duration(),
        path.display()
    );
    println!("SHA-256: {}", artifact.checksum());

    Ok(path)
}

/// Join `inputs` in order and write `joined-audio.<ext>` into `output_dir`.
///
/// Directories are expanded to the audio files they contain, sorted by path.
pub fn join(
    inputs: &[PathBuf],
    format: OutputFormat,
    fade: bool,
    output_dir: &Path,
    config: &SpliceConfig,
) -> Result<PathBuf> {
    let files = expand_inputs(inputs)?;
    info!("Joining {} files as {}", files.len(), format);

    let mut session = JoinerSession::new(config.clone());
    #[cfg(feature = "lame")]
    session.set_mp3_capability(Some(Arc::new(crate::engine::LameCapability)));
    session.set_format(format);
    session.set_fade(fade);

    for file in &files {
        let source = AudioSource::from_path(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        session
            .add_file(source)
            .with_context(|| format!("Failed to add {}", file.display()))?;
    }

    let handle = session.process().context("Join failed")?;
    let artifact = session.artifacts().get(handle)?;
    let path = write_artifact(artifact, output_dir)?;

    println!(
        "Joined {} files ({:.3}s) -> {}",
        session.entries().len(),
        session.total_duration(),
        path.display()
    );
    println!("SHA-256: {}", artifact.checksum());

    Ok(path)
}

/// Print the decoded properties of `input`.
pub fn info(input: &Path, config: &SpliceConfig) -> Result<()> {
    info!("Inspecting {}", input.display());

    let source = AudioSource::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let buffer = decode_audio(&source, config.max_file_bytes)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    println!("File:        {}", source.name);
    println!("Type:        {}", source.media_type);
    println!("Size:        {} bytes", source.size());
    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Channels:    {}", buffer.channels());
    println!("Frames:      {}", buffer.len());
    println!("Duration:    {:.3}s", buffer.duration_secs());
    println!("Peak:        {:.2} dBFS", calculate_peak(&buffer));

    Ok(())
}

/// Replace each directory with the audio files under it
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to scan {}", input.display()))?;
            if entry.file_type().is_file() && is_audio_path(entry.path()) {
                found.push(entry.into_path());
            }
        }
        if found.is_empty() {
            warn!("No audio files found in {}", input.display());
        }
        files.extend(found);
    }

    if files.is_empty() {
        bail!("No input files given");
    }
    Ok(files)
}

fn is_audio_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| media_type_for_extension(ext).starts_with("audio/"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_expand_inputs_sorts_and_filters() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.wav"), b"").unwrap();
        fs::write(dir.path().join("a.mp3"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.flac"), b"").unwrap();

        let single = PathBuf::from("first.wav");
        let files = expand_inputs(&[single.clone(), dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            files,
            vec![
                single,
                dir.path().join("a.mp3"),
                dir.path().join("b.wav"),
                dir.path().join("sub").join("c.flac"),
            ]
        );
    }

    #[test]
    fn test_expand_inputs_empty() {
        assert!(expand_inputs(&[]).is_err());
    }
}
