//! Audio settings persistence
//!
//! Settings are stored as JSON in `<config dir>/voicenote/settings.json`.

use crate::audio::DEFAULT_PLAYBACK_RATES;
use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables for capture, waveform sizes and playback arbitration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    /// Rates cycled by the playback speed button
    pub playback_rates: Vec<f64>,
    pub allow_concurrent_audio_playback: bool,
    /// Bars stored with a voice recording attachment
    pub waveform_size: usize,
    /// Bars rendered on screen
    pub display_waveform_size: usize,
    /// Metering floor for the WAV metering feed, in dBFS
    pub metering_lower_bound: f64,
    pub progress_update_interval_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            playback_rates: DEFAULT_PLAYBACK_RATES.to_vec(),
            allow_concurrent_audio_playback: false,
            waveform_size: 100,
            display_waveform_size: 80,
            metering_lower_bound: -60.0,
            progress_update_interval_ms: 100,
        }
    }
}

impl AudioSettings {
    /// Get the default settings path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voicenote")
            .join("settings.json")
    }

    /// Load from the default path, falling back to defaults on any problem
    pub fn load() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            error!("Failed to load settings: {:#}", e);
            Self::default()
        })
    }

    /// Load from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: AudioSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings.sanitized())
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, contents).context("Failed to write settings")?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        if self.playback_rates.is_empty() {
            self.playback_rates = DEFAULT_PLAYBACK_RATES.to_vec();
        }
        self
    }
}
