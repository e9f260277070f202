use serde::{Deserialize, Serialize};

use crate::audio::CaptureConfig;
use crate::config::Config;

/// Configuration for a live listening session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// BCP-47 language tag sent to the backend (e.g. "vi-VN")
    pub language: String,

    /// Optional participant names attached to the session
    #[serde(default)]
    pub participants: Vec<String>,

    /// Microphone capture parameters
    #[serde(skip)]
    pub capture: CaptureConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: "vi-VN".to_string(),
            participants: Vec::new(),
            capture: CaptureConfig::default(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            language: cfg.speech.language.clone(),
            participants: cfg.speech.participants.clone(),
            capture: CaptureConfig {
                sample_rate: cfg.audio.sample_rate,
                channels: cfg.audio.channels,
                chunk_ms: cfg.audio.chunk_ms,
            },
        }
    }
}
