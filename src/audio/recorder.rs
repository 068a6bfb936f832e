//! WAV metering feed using hound
//!
//! Replays a WAV file on disk as a recorder feed: one metering reading in
//! dBFS per update interval, the same shape a live recorder reports.

use super::capture::MeteringUpdate;
use anyhow::{Context, Result};
use std::path::Path;

/// Metering readings derived from a WAV file
pub struct WavMeteringFeed {
    samples: Vec<f32>,
    sample_rate: u32,
    interval_ms: u64,
}

impl WavMeteringFeed {
    /// Load a WAV file, downmixing to mono
    pub fn open(path: impl AsRef<Path>, interval_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;

        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<f32>, _>>()
                .context("Failed to read samples")?,
            hound::SampleFormat::Int => {
                // Scale integer samples to [-1, 1]
                let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_value))
                    .collect::<Result<Vec<f32>, _>>()
                    .context("Failed to read samples")?
            }
        };

        let mono = if channels == 1 {
            samples
        } else {
            samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        Ok(Self::from_samples(mono, spec.sample_rate, interval_ms))
    }

    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, interval_ms: u64) -> Self {
        Self {
            samples,
            sample_rate,
            interval_ms: interval_ms.max(1),
        }
    }

    fn window_len(&self) -> usize {
        ((self.sample_rate as u64 * self.interval_ms) / 1000).max(1) as usize
    }

    /// One update per interval, the last window may be shorter
    pub fn updates(&self) -> Vec<MeteringUpdate> {
        let window = self.window_len();
        let mut consumed = 0;
        self.samples
            .chunks(window)
            .map(|chunk| {
                consumed += chunk.len();
                MeteringUpdate {
                    metering: Some(rms_dbfs(chunk)),
                    position_ms: consumed as f64 * 1000.0 / self.sample_rate as f64,
                    is_done_recording: false,
                }
            })
            .collect()
    }
}

/// RMS level in dBFS; silence is negative infinity
fn rms_dbfs(chunk: &[f32]) -> f64 {
    let sum_squares: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_squares / chunk.len() as f64).sqrt();
    20.0 * rms.log10()
}
