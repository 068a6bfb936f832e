//! Command-line interface for Voicenote
//!
//! Handles argument parsing and logging configuration.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

/// Voicenote - voice message waveform and level tools
#[derive(Parser, Debug)]
#[command(name = "voicenote")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a voice recording attachment from a WAV file
    Waveform {
        file: PathBuf,

        /// Metering floor in dBFS
        #[arg(long, allow_hyphen_values = true)]
        lower_bound: Option<f64>,

        /// Number of waveform bars
        #[arg(long)]
        size: Option<usize>,
    },

    /// Resample a sequence of levels
    Resample {
        #[arg(long)]
        size: usize,

        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<f64>,
    },

    /// Normalize raw metering readings; `none` marks a missing reading
    Normalize {
        #[arg(long, allow_hyphen_values = true)]
        lower_bound: f64,

        #[arg(allow_hyphen_values = true)]
        values: Vec<String>,
    },
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for all modules - keep at warn to suppress noisy deps
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("voicenote", args.log_level());

    builder.format_timestamp_millis().init();
}
