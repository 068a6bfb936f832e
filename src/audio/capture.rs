//! Voice capture session
//!
//! Buffers normalized level readings from the recorder feed while a voice
//! message is recorded, and turns them into a fixed-size waveform once the
//! recording is finished.

use super::level::normalize_audio_level;
use super::sampling::resample;
use crate::models::VoiceRecordingAttachment;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Current state of a capture session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    Paused,
    Stopped,
}

/// One reading from the recorder feed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeteringUpdate {
    /// Raw metering on the recorder's decibel-like scale, if reported
    pub metering: Option<f64>,
    /// Elapsed recording time in milliseconds
    pub position_ms: f64,
    pub is_done_recording: bool,
}

#[derive(Default)]
struct CaptureInner {
    state: CaptureState,
    lower_bound: f64,
    /// Normalized levels (0.0 - 1.0), one per metering update
    levels: Vec<f64>,
    duration_ms: f64,
}

/// Shared capture session - thread-safe, clones share the buffer
#[derive(Clone, Default)]
pub struct VoiceCapture {
    inner: Arc<Mutex<CaptureInner>>,
}

impl VoiceCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CaptureInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    pub fn levels(&self) -> Vec<f64> {
        self.lock().levels.clone()
    }

    pub fn duration_ms(&self) -> f64 {
        self.lock().duration_ms
    }

    /// Begin a new session with the platform's metering floor
    pub fn start(&self, lower_bound: f64) {
        let mut inner = self.lock();
        *inner = CaptureInner {
            state: CaptureState::Capturing,
            lower_bound,
            ..CaptureInner::default()
        };
        debug!("Voice capture started (lower bound {} dB)", lower_bound);
    }

    /// Feed one recorder reading
    pub fn on_metering(&self, update: &MeteringUpdate) {
        let mut inner = self.lock();
        if inner.state != CaptureState::Capturing || update.is_done_recording {
            return;
        }
        inner.duration_ms = update.position_ms;
        let level = normalize_audio_level(update.metering, inner.lower_bound);
        inner.levels.push(level);
    }

    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.state == CaptureState::Capturing {
            inner.state = CaptureState::Paused;
        }
    }

    pub fn resume(&self) {
        let mut inner = self.lock();
        if inner.state == CaptureState::Paused {
            inner.state = CaptureState::Capturing;
        }
    }

    pub fn stop(&self) {
        let mut inner = self.lock();
        if matches!(inner.state, CaptureState::Capturing | CaptureState::Paused) {
            inner.state = CaptureState::Stopped;
        }
    }

    /// Discard the recording
    pub fn reset(&self) {
        *self.lock() = CaptureInner::default();
    }

    /// Display copy of the waveform at `size` bars; the buffer is untouched
    pub fn preview_waveform(&self, size: usize) -> Vec<f64> {
        resample(&self.lock().levels, size)
    }

    /// Finish the recording stored at `uri` and reset the session
    pub fn finish(&self, uri: impl Into<String>, waveform_size: usize) -> VoiceRecordingAttachment {
        let inner = std::mem::take(&mut *self.lock());
        let waveform = resample(&inner.levels, waveform_size);
        debug!(
            "Voice capture finished: {} levels over {} ms",
            inner.levels.len(),
            inner.duration_ms
        );
        VoiceRecordingAttachment::new(uri.into(), inner.duration_ms, waveform)
    }
}
