pub mod audio;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod rest;
pub mod session;
pub mod transport;

pub use audio::{CaptureConfig, CaptureEvent, LevelMeter, MicCapture};
pub use config::Config;
pub use endpoints::Endpoints;
pub use error::{Error, Result};
pub use rest::{ApiClient, ClassificationResult, ServiceStatus, TranscriptionResult};
pub use session::{ConnectionPhase, SessionConfig, SessionState, SpeechSession, TranscriptSegment};
pub use transport::{ServerEvent, StreamConfig, TransportEvent, WsTransport};
