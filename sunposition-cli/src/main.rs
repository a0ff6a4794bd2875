//! SunPosition CLI - Command-line interface
//!
//! Replays recorded orientation sensor logs through the sun position pipeline
//! and inspects the stored query freshness record.

mod commands;
mod ephemeris;
mod error;
mod sensor_log;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use sunposition::logging::{init_logging, DEFAULT_DIRECTIVE};

use commands::common::load_config;
use commands::replay::ReplayArgs;
use commands::status::StatusArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "sunposition", version, about = "Device-relative sun direction from orientation sensors")]
struct Cli {
    /// Configuration file (default: config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Debug logging and extra output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a sensor log against a fixed location and sun position
    Replay(ReplayArgs),
    /// Show whether the stored sun position is still fresh
    Status(StatusArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let directive = if cli.verbose {
        "sunposition=debug"
    } else {
        DEFAULT_DIRECTIVE
    };
    let _guard = init_logging(directive, cli.log_file.as_deref())?;

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Replay(args) => commands::replay::run(args, config, cli.verbose),
        Commands::Status(args) => commands::status::run(args, &config),
    }
}
