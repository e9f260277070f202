use serde::{Deserialize, Serialize};

/// Result of a one-shot transcription upload. Shares its text/confidence
/// shape with the streaming `transcription` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub success: bool,
    pub transcription: String,
    pub confidence: f32,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// One ranked prediction from the ambient-sound classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub class: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub success: bool,
    pub classifications: Vec<Classification>,
    pub top_prediction: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub model: String,
}

/// Health probe for one backend service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub service: String,
    /// "active", "inactive" or "error"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedLanguages {
    pub supported_languages: Vec<LanguageInfo>,
}

/// Per-sound alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSetting {
    pub sound_type: String,
    pub enabled: bool,
    pub sensitivity: f32,
    /// Delivery channels, e.g. "visual", "vibration", "email"
    pub notification_method: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSound {
    #[serde(rename = "type")]
    pub sound_type: String,
    pub name: String,
    pub default_sensitivity: f32,
    pub priority: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    #[serde(default)]
    pub alert_settings: Vec<AlertSetting>,
    pub available_sounds: Vec<AvailableSound>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub sound_type: String,
    pub confidence: f32,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertHistory {
    pub total_alerts: usize,
    pub alerts: Vec<AlertEvent>,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedSession {
    pub success: bool,
    pub session_id: String,
    pub language: String,
    #[serde(default)]
    pub participants: Vec<String>,
    pub start_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndedSession {
    pub success: bool,
    pub session_id: String,
    pub end_time: String,
    pub total_segments: usize,
    pub duration: f64,
}

/// One line of a stored session transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptLine {
    #[serde(default)]
    pub speaker: Option<String>,
    pub text: String,
    pub confidence: f32,
    pub timestamp: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTranscript {
    pub session_id: String,
    pub transcript: Vec<TranscriptLine>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub language: String,
    #[serde(default)]
    pub participants: Vec<String>,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionList {
    pub total_sessions: usize,
    pub sessions: Vec<SessionInfo>,
}
