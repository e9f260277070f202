//! Typed client for the backend's plain request/response endpoints.
//!
//! These calls have no state-machine behavior: the one-shot upload shares
//! its result shape with the streaming pathway but bypasses the session's
//! connection lifecycle entirely, and the auxiliary endpoints
//! (classification, status probes, alerts, session bookkeeping) are
//! single exchanges with no retry and no state between calls.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{
    AlertEvent, AlertHistory, AlertSetting, AlertSettings, AvailableSound, Classification,
    ClassificationResult, EndedSession, LanguageInfo, ServiceStatus, SessionInfo, SessionList,
    SessionTranscript, StartedSession, SupportedLanguages, TranscriptLine, TranscriptionResult,
};
