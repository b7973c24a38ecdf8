//! Error handling for audiosplice
//!
//! Every error is local to the operation that raised it: the session that
//! reported it keeps its prior state and stays usable.

use thiserror::Error;

/// Result type alias for audiosplice operations
pub type Result<T> = std::result::Result<T, SpliceError>;

/// Broad classes of failure, used by front ends to pick how to notify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any processing started
    InputValidation,
    /// Source bytes could not be turned into samples
    Decode,
    /// The request contradicts the current state
    Consistency,
    /// Encoding or runtime failure
    Runtime,
}

/// Main error type for audiosplice operations
#[derive(Error, Debug)]
pub enum SpliceError {
    // Input Validation Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("'{file}' is not an audio file (declared type: {media_type})")]
    NotAudio { file: String, media_type: String },

    #[error("'{file}' is too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { file: String, size: u64, limit: u64 },

    #[error("At least {required} files are needed to join, got {given}")]
    NotEnoughFiles { required: usize, given: usize },

    #[error("Invalid segment: {reason}")]
    InvalidSegment { reason: String },

    #[error("Segment index {index} out of range ({len} segments)")]
    SegmentOutOfRange { index: usize, len: usize },

    // Decode Errors
    #[error("Failed to decode '{file}': {reason}")]
    Decode { file: String, reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Consistency Errors
    #[error("Segment [{start:.3}s, {end:.3}s) overlaps an existing segment")]
    SegmentOverlap { start: f64, end: f64 },

    #[error("Cannot join '{file}': {reason}")]
    FormatMismatch { file: String, reason: String },

    #[error("Invalid audio buffer: {reason}")]
    InvalidBuffer { reason: String },

    #[error("No segments to cut")]
    NoSegments,

    #[error("No audio loaded")]
    NoAudioLoaded,

    #[error("Unknown file entry: {id}")]
    UnknownEntry { id: String },

    // Encode / Runtime Errors
    #[error("MP3 encoder is not available")]
    EncoderUnavailable,

    #[error("Encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Another {operation} is already in progress")]
    Busy { operation: &'static str },

    #[error("Unknown or revoked artifact handle: {handle}")]
    UnknownArtifact { handle: u64 },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SpliceError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SpliceError::FileNotFound { .. } => "FILE_NOT_FOUND",
            SpliceError::NotAudio { .. } => "NOT_AUDIO",
            SpliceError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            SpliceError::NotEnoughFiles { .. } => "NOT_ENOUGH_FILES",
            SpliceError::InvalidSegment { .. } => "INVALID_SEGMENT",
            SpliceError::SegmentOutOfRange { .. } => "SEGMENT_OUT_OF_RANGE",
            SpliceError::Decode { .. } => "DECODE_ERROR",
            SpliceError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SpliceError::SegmentOverlap { .. } => "SEGMENT_OVERLAP",
            SpliceError::FormatMismatch { .. } => "FORMAT_MISMATCH",
            SpliceError::InvalidBuffer { .. } => "INVALID_BUFFER",
            SpliceError::NoSegments => "NO_SEGMENTS",
            SpliceError::NoAudioLoaded => "NO_AUDIO_LOADED",
            SpliceError::UnknownEntry { .. } => "UNKNOWN_ENTRY",
            SpliceError::EncoderUnavailable => "ENCODER_UNAVAILABLE",
            SpliceError::EncodeFailed { .. } => "ENCODE_FAILED",
            SpliceError::Busy { .. } => "BUSY",
            SpliceError::UnknownArtifact { .. } => "UNKNOWN_ARTIFACT",
            SpliceError::Config { .. } => "CONFIG_ERROR",
            SpliceError::Io(_) => "IO_ERROR",
            SpliceError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Classify the error
    pub fn category(&self) -> ErrorCategory {
        match self {
            SpliceError::FileNotFound { .. }
            | SpliceError::NotAudio { .. }
            | SpliceError::FileTooLarge { .. }
            | SpliceError::NotEnoughFiles { .. }
            | SpliceError::InvalidSegment { .. }
            | SpliceError::SegmentOutOfRange { .. }
            | SpliceError::Config { .. } => ErrorCategory::InputValidation,
            SpliceError::Decode { .. }
            | SpliceError::UnsupportedFormat { .. } => ErrorCategory::Decode,
            SpliceError::SegmentOverlap { .. }
            | SpliceError::FormatMismatch { .. }
            | SpliceError::InvalidBuffer { .. }
            | SpliceError::NoSegments
            | SpliceError::NoAudioLoaded
            | SpliceError::UnknownEntry { .. } => ErrorCategory::Consistency,
            SpliceError::EncoderUnavailable
            | SpliceError::EncodeFailed { .. }
            | SpliceError::Busy { .. }
            | SpliceError::UnknownArtifact { .. }
            | SpliceError::Io(_)
            | SpliceError::Serialization(_) => ErrorCategory::Runtime,
        }
    }

    /// Check if the user can retry after adjusting their input
    ///
    /// Nothing here is fatal to a session; this only separates errors a
    /// retry can fix from ones that need a different build or environment.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SpliceError::EncoderUnavailable | SpliceError::InvalidBuffer { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SpliceError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            SpliceError::NotAudio { .. } => vec![
                "Select an audio file (wav, mp3, flac, ogg, m4a)",
                "Rename the file if its extension is wrong",
            ],
            SpliceError::FileTooLarge { .. } => vec![
                "Trim the file in another tool first",
                "Raise max_file_bytes in the configuration file",
            ],
            SpliceError::NotEnoughFiles { .. } => vec!["Add at least two files to join"],
            SpliceError::Decode { .. } => vec![
                "Try converting the file to WAV format first",
                "Check if the file plays in another application",
                "The file may be corrupted - try re-exporting from source",
            ],
            SpliceError::SegmentOverlap { .. } => vec![
                "Move the playhead outside existing segments",
                "Shorten or remove the neighbouring segment",
            ],
            SpliceError::FormatMismatch { .. } => vec![
                "Convert all inputs to the same sample rate and channel count",
            ],
            SpliceError::NoSegments => vec!["Add at least one segment before cutting"],
            SpliceError::EncoderUnavailable => vec![
                "Export as WAV instead",
                "Rebuild with the 'lame' feature enabled",
            ],
            SpliceError::Busy { .. } => vec!["Wait for the current operation to finish"],
            _ => vec![],
        }
    }
}
