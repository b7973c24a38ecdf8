//! Audio Engine Module
//!
//! Core processing for cutting and joining:
//! - Audio buffers and decoding
//! - Segment model and the cut engine
//! - Join engine with fades
//! - WAV and MP3 encoding, output artifacts
//! - Preview transport and its ticker

pub mod artifact;
pub mod buffer;
pub mod cut;
pub mod decode;
pub mod fade;
pub mod join;
pub mod mp3;
pub mod segment;
pub mod ticker;
pub mod transport;
pub mod wav;

pub use artifact::{
    cut_file_name, joined_file_name, write_artifact, ArtifactHandle, ArtifactRegistry,
    OutputArtifact, OutputFormat,
};
pub use buffer::{calculate_peak, linear_to_db, secs_to_samples, AudioBuffer};
pub use cut::cut_segments;
pub use decode::{decode_audio, media_type_for_extension, validate_source, AudioSource};
pub use fade::apply_fade;
pub use join::{join_buffers, join_sources, MIN_JOIN_INPUTS};
#[cfg(feature = "lame")]
pub use mp3::LameCapability;
pub use mp3::{encode_mp3, Mp3Capability, Mp3Stream};
pub use segment::{has_overlap, Segment, SegmentBound, SegmentList};
pub use ticker::Ticker;
pub use transport::{PlaybackTransport, PreviewPlayer, TransportState};
pub use wav::{encode_wav, f32_to_pcm16, WAV_HEADER_LEN};
