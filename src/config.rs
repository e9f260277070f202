use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub speech: SpeechConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    /// BCP-47 language tag sent with every session configuration
    pub language: String,
    /// Optional participant names attached to live sessions
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Length of each emitted capture chunk in milliseconds
    pub chunk_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "sonara".to_string(),
            },
            speech: SpeechConfig {
                language: "vi-VN".to_string(),
                participants: Vec::new(),
            },
            audio: AudioConfig {
                sample_rate: 16000, // transcription backend expects 16kHz
                channels: 1,        // mono
                chunk_ms: 1000,     // one chunk per second
            },
        }
    }
}
