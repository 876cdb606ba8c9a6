pub mod error;
pub mod poller;
pub mod service;
pub mod status;

use chrono::{DateTime, Utc};
pub use error::{RenderError, RenderErrorKind};
pub use poller::{JobCompletionPoller, PolledVideo};
use serde::{Deserialize, Serialize};
pub use service::{RenderService, RenderServiceApi};
pub use status::{JobState, StatusSnapshot, UrlClass};

/// Request to render one talking-avatar video.
///
/// Exactly one of `text` or `audio_source_url` drives the spoken content;
/// `avatar_id` selects the visual character. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub avatar_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_source_url: Option<String>,
}

impl RenderRequest {
    pub fn from_text(text: impl Into<String>, avatar_id: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            avatar_id: avatar_id.into(),
            voice_id: None,
            audio_source_url: None,
        }
    }

    pub fn from_audio(audio_source_url: impl Into<String>, avatar_id: impl Into<String>) -> Self {
        Self {
            text: None,
            avatar_id: avatar_id.into(),
            voice_id: None,
            audio_source_url: Some(audio_source_url.into()),
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// The content that drives the spoken output: the text, or for the
    /// audio-driven variant the audio source URL. Used for fingerprinting.
    pub fn spoken_source(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or(self.audio_source_url.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// One in-flight unit of work at the provider. Job state lives remotely and
/// is observed via polling; nothing here mutates after creation.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub job_id: String,
    pub request: RenderRequest,
    pub submitted_at: DateTime<Utc>,
}

/// Result of a render, as handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub video_url: String,
    /// True when the URL came from the persistent cache with no provider call.
    pub cached: bool,
    /// True when polling exhausted its budget and fell back to a landing-page
    /// URL. A native player cannot render such a URL; the UI must branch on
    /// this flag.
    pub degraded: bool,
}
