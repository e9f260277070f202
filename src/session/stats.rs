use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single transcription update received during a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Transcribed text
    pub text: String,

    /// When this segment was received
    pub timestamp: DateTime<Utc>,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,

    /// Whether the backend marked this as a final (non-interim) result
    pub is_final: bool,
}
