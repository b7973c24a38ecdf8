//! CLI Module
//!
//! Command-line interface for cutting and joining audio files.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::engine::OutputFormat;

/// Audiosplice - cut segments out of audio files and join files together
#[derive(Parser, Debug)]
#[command(name = "audiosplice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut segments out of one file into cut-<name>.wav
    #[command(name = "cut")]
    Cut {
        /// Input audio file
        input: PathBuf,

        /// Segment to keep, as START:END in seconds (repeatable)
        #[arg(short, long = "segment", value_parser = parse_segment, required = true)]
        segments: Vec<(f64, f64)>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Join files (or directories of files) end to end
    #[command(name = "join")]
    Join {
        /// Input files or directories, in join order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Wav)]
        format: FormatArg,

        /// Fade the joined audio in and out
        #[arg(long)]
        fade: bool,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print decoded properties of a file
    #[command(name = "info")]
    Info {
        /// Input audio file
        input: PathBuf,
    },
}

/// Output format as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Wav,
    Mp3,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Wav => OutputFormat::Wav,
            FormatArg::Mp3 => OutputFormat::Mp3,
        }
    }
}

/// Parse `START:END` seconds
pub fn parse_segment(value: &str) -> std::result::Result<(f64, f64), String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{}'", value))?;
    let start: f64 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start time '{}'", start))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end time '{}'", end))?;
    if !(start >= 0.0 && end > start) {
        return Err(format!("segment {} must satisfy 0 <= START < END", value));
    }
    Ok((start, end))
}
