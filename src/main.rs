//! Voicenote - voice message audio tools
//!
//! Command-line entry point over the voicenote library.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Command;
use log::info;
use voicenote::audio::{normalize_audio_level, resample, VoiceCapture, WavMeteringFeed};
use voicenote::AudioSettings;

fn main() -> Result<()> {
    // Parse command-line arguments and initialize logging
    let args = cli::Args::parse();
    cli::init_logging(&args);

    let settings = match &args.config {
        Some(path) => AudioSettings::load_from(path)?,
        None => AudioSettings::load(),
    };

    info!("Starting voicenote");

    match args.command {
        Command::Waveform {
            file,
            lower_bound,
            size,
        } => {
            let feed = WavMeteringFeed::open(&file, settings.progress_update_interval_ms)?;

            let capture = VoiceCapture::new();
            capture.start(lower_bound.unwrap_or(settings.metering_lower_bound));
            for update in feed.updates() {
                capture.on_metering(&update);
            }
            capture.stop();

            let uri = format!("file://{}", file.display());
            let attachment = capture.finish(uri, size.unwrap_or(settings.waveform_size));
            print_json(&attachment)
        }
        Command::Resample { size, values } => print_json(&resample(&values, size)),
        Command::Normalize {
            lower_bound,
            values,
        } => {
            let levels = values
                .iter()
                .map(|value| parse_reading(value).map(|raw| normalize_audio_level(raw, lower_bound)))
                .collect::<Result<Vec<f64>>>()?;
            print_json(&levels)
        }
    }
}

fn parse_reading(value: &str) -> Result<Option<f64>> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let raw = value
        .parse::<f64>()
        .with_context(|| format!("Invalid metering reading '{}'", value))?;
    Ok(Some(raw))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
