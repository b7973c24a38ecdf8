//! Audiosplice - Audio Cutter and Joiner
//!
//! Cuts user-chosen segments out of one audio file, or joins several files
//! end to end, and encodes the result as WAV or (with an encoder installed)
//! MP3.
//!
//! # Architecture
//!
//! - `engine`: pure functions over decoded buffers (decode, cut, join,
//!   fade, encode) plus the preview transport
//! - `session`: cutter and joiner state built on the engine
//! - `cli`: the `audiosplice-cli` command-line front end

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use config::SpliceConfig;
pub use error::{ErrorCategory, Result, SpliceError};
pub use session::{CutterSession, JoinerSession};
