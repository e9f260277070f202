use serde::{Deserialize, Serialize};

/// Session configuration sent as the first frame after the channel opens.
///
/// Re-sent verbatim on every reconnect attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub language: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub participants: Vec<String>,
}

/// Structured event received from the transcription backend.
///
/// The wire format is a JSON object discriminated by a `type` field; all
/// type-specific fields are optional on the wire and default here so a
/// sparse frame still parses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionStarted {
        session_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Transcription {
        #[serde(default)]
        text: String,
        #[serde(default)]
        confidence: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_final: Option<bool>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    SessionEnded {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}
