//! Voicenote - voice message audio core
//!
//! Waveform sampling for recorded voice messages and exclusive playback
//! arbitration across every audio player on screen.

pub mod audio;
pub mod models;
pub mod settings;
pub mod state;

pub use audio::{AudioPlayer, AudioPlayerPool};
pub use models::{AudioDescriptor, AudioKind, VoiceRecordingAttachment};
pub use settings::AudioSettings;
