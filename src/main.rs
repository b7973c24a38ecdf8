//! Audiosplice CLI
//!
//! Command-line front end for cutting and joining audio files.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use audiosplice::cli::{commands, Cli, Commands};
use audiosplice::SpliceConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Audiosplice v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => SpliceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SpliceConfig::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("Audiosplice v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &SpliceConfig) -> Result<()> {
    match cmd {
        Commands::Cut {
            input,
            segments,
            output,
        } => commands::cut(&input, &segments, &output, config).map(|_| ()),
        Commands::Join {
            inputs,
            format,
            fade,
            output,
        } => commands::join(&inputs, format.into(), fade, &output, config).map(|_| ()),
        Commands::Info { input } => commands::info(&input, config),
    }
}
