//! Speech request types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::Voice;

/// Audio container requested from the speech endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
}

impl AudioFormat {
    /// Value of the `response_format` request field.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }

    /// File extension used by the asset store (also the probe hint).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Opus => "ogg",
            Self::Aac => "aac",
            other => other.wire_name(),
        }
    }

    /// Whether a response `Content-Type` plausibly carries this format.
    pub fn matches_content_type(self, content_type: &str) -> bool {
        let mime = content_type
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or_default();

        match self {
            Self::Mp3 => matches!(mime, "audio/mpeg" | "audio/mp3"),
            Self::Opus => matches!(mime, "audio/opus" | "audio/ogg" | "application/ogg"),
            Self::Aac => matches!(mime, "audio/aac" | "audio/mp4"),
            Self::Flac => matches!(mime, "audio/flac" | "audio/x-flac"),
            Self::Wav => matches!(mime, "audio/wav" | "audio/x-wav" | "audio/wave"),
        }
    }
}

/// Request for speech synthesis.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Voice,
    pub format: AudioFormat,
    pub speed: Option<f64>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: Voice, format: AudioFormat) -> Self {
        Self {
            text: text.into(),
            voice,
            format,
            speed: None,
        }
    }
}
