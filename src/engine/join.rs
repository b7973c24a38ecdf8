//! Join engine
//!
//! Appends whole buffers end to end. Inputs must already agree on sample
//! rate and channel count; nothing is resampled or remixed.

use log::info;

use crate::engine::buffer::AudioBuffer;
use crate::engine::decode::{decode_audio, AudioSource};
use crate::engine::fade::apply_fade;
use crate::error::{Result, SpliceError};

/// Fewest inputs a join accepts
pub const MIN_JOIN_INPUTS: usize = 2;

/// Concatenate buffers in order, optionally fading the result
///
/// # Arguments
/// * `buffers` - Inputs in output order
/// * `fade_secs` - Fade window applied to the joined buffer, if any
///
/// # Errors
/// * `NotEnoughFiles` - Fewer than two inputs
/// * `FormatMismatch` - Inputs disagree on sample rate or channel count
pub fn join_buffers(buffers: &[AudioBuffer], fade_secs: Option<f64>) -> Result<AudioBuffer> {
    let labels: Vec<String> = (1..=buffers.len()).map(|i| format!("input {}", i)).collect();
    let named: Vec<(&str, &AudioBuffer)> = labels
        .iter()
        .map(String::as_str)
        .zip(buffers.iter())
        .collect();
    concat(&named, fade_secs)
}

/// Decode every source and join them
///
/// The first source that fails to decode aborts the whole join; the error
/// names that file.
pub fn join_sources(
    sources: &[&AudioSource],
    max_bytes: u64,
    fade_secs: Option<f64>,
) -> Result<AudioBuffer> {
    if sources.len() < MIN_JOIN_INPUTS {
        return Err(SpliceError::NotEnoughFiles {
            required: MIN_JOIN_INPUTS,
            given: sources.len(),
        });
    }

    let decoded = sources
        .iter()
        .map(|source| decode_audio(source, max_bytes))
        .collect::<Result<Vec<_>>>()?;

    let named: Vec<(&str, &AudioBuffer)> = sources
        .iter()
        .map(|s| s.name.as_str())
        .zip(decoded.iter())
        .collect();
    concat(&named, fade_secs)
}

fn concat(inputs: &[(&str, &AudioBuffer)], fade_secs: Option<f64>) -> Result<AudioBuffer> {
    if inputs.len() < MIN_JOIN_INPUTS {
        return Err(SpliceError::NotEnoughFiles {
            required: MIN_JOIN_INPUTS,
            given: inputs.len(),
        });
    }

    let (_, first) = inputs[0];
    for (name, buffer) in &inputs[1..] {
        if buffer.sample_rate() != first.sample_rate() {
            return Err(SpliceError::FormatMismatch {
                file: name.to_string(),
                reason: format!(
                    "sample rate {} Hz differs from {} Hz",
                    buffer.sample_rate(),
                    first.sample_rate()
                ),
            });
        }
        if buffer.channels() != first.channels() {
            return Err(SpliceError::FormatMismatch {
                file: name.to_string(),
                reason: format!(
                    "{} channels differs from {} channels",
                    buffer.channels(),
                    first.channels()
                ),
            });
        }
    }

    let total: usize = inputs.iter().map(|(_, b)| b.len()).sum();
    let channels = (0..first.channels())
        .map(|ch| {
            let mut data = Vec::with_capacity(total);
            for (_, buffer) in inputs {
                data.extend_from_slice(buffer.channel(ch));
            }
            data
        })
        .collect();
    let mut output = AudioBuffer::from_channels(channels, first.sample_rate())?;

    if let Some(secs) = fade_secs {
        apply_fade(&mut output, secs);
    }

    info!(
        "Joined {} inputs into {} samples ({:.3}s, fade: {})",
        inputs.len(),
        output.len(),
        output.duration_secs(),
        fade_secs.is_some()
    );

    Ok(output)
}
