//! Voice message audio core
//!
//! This module provides:
//! - Level normalization of recorder metering
//! - Waveform resampling (LTTB reduction, bucket expansion)
//! - Voice capture sessions and a WAV-backed metering feed
//! - Per-source playback state machines and the pool arbitrating them

mod capture;
mod driver;
mod level;
mod playback;
mod pool;
mod recorder;
mod sampling;

pub use capture::{CaptureState, MeteringUpdate, VoiceCapture};
pub use driver::{
    DriverFactory, PitchCorrectionQuality, PlaybackDriver, PlaybackStatus, StatusListener,
};
pub use level::{normalize_audio_level, UPPER_BOUND};
pub use playback::{
    transition, AudioPlayer, AudioPlayerState, PlayerEvent, DEFAULT_PLAYBACK_RATES,
};
pub use pool::{AudioPlayerPool, AudioPlayerPoolState};
pub use recorder::WavMeteringFeed;
pub use sampling::{downsample, resample, upsample};
