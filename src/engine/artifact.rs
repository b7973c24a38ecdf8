//! Output artifacts and their revocable handles
//!
//! An artifact is an encoded file waiting to be downloaded. Handles to
//! artifacts behave like object URLs: they stay valid until revoked, and a
//! session revokes each one as soon as something supersedes it.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::{Result, SpliceError};

/// Encoded output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Wav,
    Mp3,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
        }
    }

    /// Media type attached to the encoded bytes
    pub fn media_type(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "audio/wav",
            OutputFormat::Mp3 => "audio/mp3",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Suggested name for cutter output: `cut-<basename>.wav`
pub fn cut_file_name(base_name: &str) -> String {
    format!("cut-{}.{}", base_name, OutputFormat::Wav.extension())
}

/// Suggested name for joiner output: `joined-audio.<ext>`
pub fn joined_file_name(format: OutputFormat) -> String {
    format!("joined-audio.{}", format.extension())
}

/// Encoded bytes plus how to present them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub file_name: String,
}

impl OutputArtifact {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 of the bytes, lowercase hex
    pub fn checksum(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Write an artifact into `dir` under its suggested name
pub fn write_artifact(artifact: &OutputArtifact, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.bytes)?;
    debug!("Wrote {} bytes to {}", artifact.len(), path.display());
    Ok(path)
}

/// Opaque reference to a registered artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactHandle(u64);

impl ArtifactHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifact:{}", self.0)
    }
}

/// Live artifacts addressable by handle
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    next_id: u64,
    live: HashMap<u64, OutputArtifact>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact and hand out a new handle
    pub fn create(&mut self, artifact: OutputArtifact) -> ArtifactHandle {
        self.next_id += 1;
        let handle = ArtifactHandle(self.next_id);
        debug!("Created {} ({})", handle, artifact.file_name);
        self.live.insert(handle.0, artifact);
        handle
    }

    /// Look up a live artifact
    pub fn get(&self, handle: ArtifactHandle) -> Result<&OutputArtifact> {
        self.live
            .get(&handle.0)
            .ok_or(SpliceError::UnknownArtifact { handle: handle.0 })
    }

    /// Release an artifact; returns false if it was already gone
    pub fn revoke(&mut self, handle: ArtifactHandle) -> bool {
        let removed = self.live.remove(&handle.0).is_some();
        if removed {
            debug!("Revoked {}", handle);
        }
        removed
    }

    /// Number of artifacts not yet revoked
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Revoke everything
    pub fn clear(&mut self) {
        self.live.clear();
    }
}
