use serde::{Deserialize, Serialize};

use crate::transport::ServerEvent;

/// Discrete connection lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Listening,
    Stopping,
}

/// Snapshot of everything a renderer needs about the live session.
///
/// Owned exclusively by the session; mutated only through [`SessionState::apply`]
/// and the session's command methods, never externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: ConnectionPhase,
    /// Backend-assigned identifier, present while listening.
    pub session_id: Option<String>,
    /// Latest known full or partial text; replaced wholesale, never appended.
    pub transcript: String,
    /// Paired with `transcript`; the two always change together.
    pub confidence: f32,
    /// Input level in [0, 100], refreshed while listening.
    pub audio_level: f32,
    /// Human-readable failure description, cleared by the next successful
    /// action or an explicit clear.
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            session_id: None,
            transcript: String::new(),
            confidence: 0.0,
            audio_level: 0.0,
            last_error: None,
        }
    }
}

/// Everything that can happen to a live session, funneled through one
/// entry point so each handler runs to completion before the next.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Structured event from the streaming transport.
    Server(ServerEvent),
    /// The transport gave up reconnecting.
    TransportFailed(String),
    /// The capture device failed mid-session.
    CaptureFailed(String),
    /// Periodic input-level sample.
    Level(f32),
}

/// What the session must do after a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    None,
    /// The session is over; any live capture/transport handles must be
    /// released.
    ReleaseHandles,
}

impl SessionState {
    /// Applies one event and returns the required followup action.
    pub fn apply(&mut self, event: SessionEvent) -> Followup {
        match event {
            SessionEvent::Server(ServerEvent::SessionStarted { session_id, .. }) => {
                self.phase = ConnectionPhase::Listening;
                self.session_id = session_id;
                self.last_error = None;
                Followup::None
            }
            SessionEvent::Server(ServerEvent::Transcription {
                text, confidence, ..
            }) => {
                // Replaced together, even when the text is empty.
                self.transcript = text;
                self.confidence = confidence;
                Followup::None
            }
            SessionEvent::Server(ServerEvent::Error { message }) => {
                self.fail(message.unwrap_or_else(|| "unknown server error".to_string()))
            }
            SessionEvent::Server(ServerEvent::SessionEnded { .. }) => {
                self.phase = ConnectionPhase::Idle;
                self.session_id = None;
                self.audio_level = 0.0;
                Followup::ReleaseHandles
            }
            SessionEvent::TransportFailed(message) => self.fail(message),
            SessionEvent::CaptureFailed(message) => self.fail(message),
            SessionEvent::Level(level) => {
                if self.phase == ConnectionPhase::Listening {
                    self.audio_level = level.clamp(0.0, 100.0);
                }
                Followup::None
            }
        }
    }

    /// A reported failure never leaves a partially-alive session behind.
    fn fail(&mut self, message: String) -> Followup {
        self.last_error = Some(message);
        self.phase = ConnectionPhase::Idle;
        self.session_id = None;
        self.audio_level = 0.0;
        Followup::ReleaseHandles
    }
}
