use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for the session core.
///
/// Parse failures on inbound streaming frames are deliberately absent:
/// the transport logs and discards them without surfacing anything.
#[derive(Debug, Error)]
pub enum Error {
    /// Microphone permission denied or no input device exists.
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// Device-level failure during active capture.
    #[error("audio capture failed: {0}")]
    Capture(String),

    /// The streaming channel failed to open, or closed and exhausted its
    /// reconnect budget.
    #[error("connection failed: {0}")]
    ConnectionFailure(String),

    /// One-shot upload request failed; independent of the streaming session.
    #[error("upload failed: {0}")]
    UploadFailure(String),

    /// The backend sent an explicit error message over the stream.
    #[error("server reported error: {0}")]
    ServerReported(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
