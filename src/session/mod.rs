//! Live listening session management
//!
//! This module provides the `SpeechSession` abstraction that manages:
//! - Microphone capture and chunk forwarding
//! - The streaming transport lifecycle (connect, reconnect, teardown)
//! - Folding asynchronous server events into one coherent state snapshot
//! - The command surface the dashboard drives (start, stop, upload, clear)

mod config;
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use session::SpeechSession;
pub use state::{ConnectionPhase, Followup, SessionEvent, SessionState};
pub use stats::TranscriptSegment;
