/// Backend endpoint set, fixed per build profile.
///
/// Exactly two sets exist (development and production) and the choice is
/// made at build time; there is no runtime endpoint configuration.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Bidirectional live-transcription endpoint.
    pub stream_url: String,
    /// Base URL for the REST endpoints (upload, classify, status, alerts).
    pub api_base: String,
}

const DEV_STREAM_URL: &str = "ws://localhost:8000/api/transcription/live";
const DEV_API_BASE: &str = "http://localhost:8000";

const PROD_STREAM_URL: &str = "wss://api.sonara.app/api/transcription/live";
const PROD_API_BASE: &str = "https://api.sonara.app";

impl Endpoints {
    /// Select the endpoint set for this build: development addresses in
    /// debug builds, production addresses in release builds.
    pub fn from_environment() -> Self {
        if cfg!(debug_assertions) {
            Self {
                stream_url: DEV_STREAM_URL.to_string(),
                api_base: DEV_API_BASE.to_string(),
            }
        } else {
            Self {
                stream_url: PROD_STREAM_URL.to_string(),
                api_base: PROD_API_BASE.to_string(),
            }
        }
    }
}
