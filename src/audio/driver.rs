//! Playback driver interface
//!
//! A driver performs the actual transport (play, pause, seek) for one audio
//! source on behalf of an [`AudioPlayer`](super::AudioPlayer). Drivers are
//! platform specific and live outside this crate; the player only relies on
//! the capability set below.
//!
//! Driver commands must not block: they hand the request to the platform
//! and return. Status updates come back through the [`StatusListener`]
//! registered when the driver is attached, and must be delivered outside of
//! the command methods.

use crate::models::AudioDescriptor;
use anyhow::Result;
use std::sync::Arc;

/// Pitch correction quality requested when changing the playback rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PitchCorrectionQuality {
    Low,
    Medium,
    #[default]
    High,
}

/// Status update reported by a driver (times in seconds)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
    pub position: f64,
    pub duration: f64,
    pub did_just_finish: bool,
    pub is_looping: bool,
    pub error: Option<String>,
    /// Replay of a just-captured recording; only `position / duration` is
    /// used and reaching the end stops the player
    pub is_preview: bool,
}

/// Callback a driver invokes with status updates
pub type StatusListener = Arc<dyn Fn(PlaybackStatus) + Send + Sync>;

/// Transport capabilities of a platform audio backend
pub trait PlaybackDriver: Send {
    /// Register the callback for position/duration updates
    fn set_status_listener(&mut self, listener: StatusListener);

    /// Start or resume playback
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Seek to a position in seconds
    fn seek(&mut self, position: f64) -> Result<()>;

    /// Restart from the beginning.
    ///
    /// Only used when [`replays_on_zero_seek`](Self::replays_on_zero_seek)
    /// is true; otherwise a seek to zero goes through [`seek`](Self::seek).
    fn replay_from_start(&mut self) -> Result<()> {
        self.seek(0.0)
    }

    /// Whether seeking to exactly zero must be issued as a replay
    fn replays_on_zero_seek(&self) -> bool {
        false
    }

    /// Change the playback rate
    fn set_rate(
        &mut self,
        rate: f64,
        preserve_pitch: bool,
        quality: PitchCorrectionQuality,
    ) -> Result<()>;

    /// Stop and unload; called once when the driver is detached
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Creates a driver for each newly pooled player
pub trait DriverFactory: Send + Sync {
    fn create(&self, descriptor: &AudioDescriptor) -> Result<Box<dyn PlaybackDriver>>;
}

impl<F> DriverFactory for F
where
    F: Fn(&AudioDescriptor) -> Result<Box<dyn PlaybackDriver>> + Send + Sync,
{
    fn create(&self, descriptor: &AudioDescriptor) -> Result<Box<dyn PlaybackDriver>> {
        self(descriptor)
    }
}
