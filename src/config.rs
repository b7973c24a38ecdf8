//! Tool configuration
//!
//! All limits and defaults used by the sessions live here. A configuration
//! file is optional; missing fields fall back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpliceError};

/// Default upload ceiling (50 MB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Length of a segment created at the playhead
pub const DEFAULT_SEGMENT_SECS: f64 = 30.0;

/// Minimum distance between a segment's start and end
pub const DEFAULT_MIN_SEGMENT_GAP_SECS: f64 = 0.1;

/// Joiner fade window
pub const DEFAULT_FADE_SECS: f64 = 1.5;

/// MP3 bitrate
pub const DEFAULT_MP3_BITRATE_KBPS: u32 = 128;

/// Samples per channel handed to the MP3 encoder per call
pub const DEFAULT_MP3_BLOCK_SIZE: usize = 1152;

/// Cursor polling interval (roughly one display frame)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 16;

/// Settings shared by the cutter and joiner sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceConfig {
    /// Largest accepted input file in bytes
    pub max_file_bytes: u64,
    /// Length of a newly added segment in seconds
    pub default_segment_secs: f64,
    /// Minimum segment length in seconds
    pub min_segment_gap_secs: f64,
    /// Fade-in / fade-out window in seconds
    pub fade_secs: f64,
    /// MP3 bitrate in kbps
    pub mp3_bitrate_kbps: u32,
    /// MP3 encoder block size in samples per channel
    pub mp3_block_size: usize,
    /// Playback cursor polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            default_segment_secs: DEFAULT_SEGMENT_SECS,
            min_segment_gap_secs: DEFAULT_MIN_SEGMENT_GAP_SECS,
            fade_secs: DEFAULT_FADE_SECS,
            mp3_bitrate_kbps: DEFAULT_MP3_BITRATE_KBPS,
            mp3_block_size: DEFAULT_MP3_BLOCK_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SpliceConfig {
    /// Load a configuration file, validating the result
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SpliceError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        let config: SpliceConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("default_segment_secs", self.default_segment_secs),
            ("min_segment_gap_secs", self.min_segment_gap_secs),
            ("fade_secs", self.fade_secs),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SpliceError::Config {
                    reason: format!("{} must be a positive number, got {}", name, value),
                });
            }
        }

        if self.max_file_bytes == 0 {
            return Err(SpliceError::Config {
                reason: "max_file_bytes must be greater than zero".to_string(),
            });
        }
        if self.mp3_bitrate_kbps == 0 || self.mp3_block_size == 0 || self.poll_interval_ms == 0 {
            return Err(SpliceError::Config {
                reason: "mp3_bitrate_kbps, mp3_block_size and poll_interval_ms must be non-zero"
                    .to_string(),
            });
        }
        if self.min_segment_gap_secs >= self.default_segment_secs {
            return Err(SpliceError::Config {
                reason: "min_segment_gap_secs must be shorter than default_segment_secs"
                    .to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SpliceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_bytes, 52_428_800);
        assert_eq!(config.mp3_block_size, 1152);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fade_secs": 0.5 }}"#).unwrap();

        let config = SpliceConfig::load(file.path()).unwrap();
        assert_eq!(config.fade_secs, 0.5);
        assert_eq!(config.default_segment_secs, DEFAULT_SEGMENT_SECS);
    }

    #[test]
    fn test_rejects_zero_fade() {
        let config = SpliceConfig {
            fade_secs: 0.0,
            ..SpliceConfig::default()
        };
        assert!(matches!(config.validate(), Err(SpliceError::Config { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = SpliceConfig::load(Path::new("/nonexistent/splice.json"));
        assert!(matches!(result, Err(SpliceError::FileNotFound { .. })));
    }
}
