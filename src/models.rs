use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of playable source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AudioKind {
    /// Recorded in-app; the descriptor duration is authoritative
    VoiceRecording,
    #[default]
    Audio,
}

/// Identity of a playable source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioDescriptor {
    pub id: String,
    pub uri: String,
    /// Seconds; 0 until known
    pub duration: f64,
    pub mime_type: String,
    #[serde(default)]
    pub kind: AudioKind,
}

impl AudioDescriptor {
    /// Describe a source rendered on behalf of `requester`.
    ///
    /// Every mount of the same attachment resolves to the same id and so to
    /// the same pooled player.
    pub fn for_requester(
        requester: &str,
        uri: impl Into<String>,
        sub_id: Option<&str>,
        kind: AudioKind,
    ) -> Self {
        let uri = uri.into();
        Self {
            id: audio_player_id(requester, &uri, sub_id),
            uri,
            duration: 0.0,
            mime_type: String::new(),
            kind,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// Deterministic player id for `(requester, uri, sub_id)`
pub fn audio_player_id(requester: &str, uri: &str, sub_id: Option<&str>) -> String {
    match sub_id {
        Some(sub_id) => format!("{}-{}-{}", requester, uri, sub_id),
        None => format!("{}-{}", requester, uri),
    }
}

/// Attachment type tag for voice messages
pub const VOICE_RECORDING_TYPE: &str = "voiceRecording";

/// MIME type of in-app voice recordings
pub const VOICE_RECORDING_MIME_TYPE: &str = "audio/aac";

/// A finished voice recording ready to hand to the attachment layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceRecordingAttachment {
    pub asset_url: String,
    /// Seconds, rounded to milliseconds
    pub duration: f64,
    pub file_size: u64,
    pub mime_type: String,
    pub title: String,
    #[serde(rename = "type")]
    pub attachment_type: String,
    pub waveform_data: Vec<f64>,
    pub local_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl VoiceRecordingAttachment {
    pub fn new(asset_url: String, duration_ms: f64, waveform_data: Vec<f64>) -> Self {
        let now = Utc::now();
        Self {
            asset_url,
            duration: duration_ms.round() / 1000.0,
            file_size: 0,
            mime_type: VOICE_RECORDING_MIME_TYPE.to_string(),
            title: recording_title(&now),
            attachment_type: VOICE_RECORDING_TYPE.to_string(),
            waveform_data,
            local_id: Uuid::new_v4(),
            created_at: now,
        }
    }

    /// Descriptor for previewing this recording in a player
    pub fn descriptor(&self, requester: &str) -> AudioDescriptor {
        AudioDescriptor::for_requester(
            requester,
            self.asset_url.clone(),
            None,
            AudioKind::VoiceRecording,
        )
        .with_duration(self.duration)
        .with_mime_type(self.mime_type.clone())
    }
}

/// File title from the ISO timestamp with `.` and `:` replaced
fn recording_title(date: &DateTime<Utc>) -> String {
    format!("audio_recording_{}.aac", date.format("%Y-%m-%dT%H_%M_%S_%3fZ"))
}
