// State-machine transition tests. Every inbound event goes through
// SessionState::apply, so the full lifecycle is exercised here without a
// device or a socket.

use sonara::session::{ConnectionPhase, Followup, SessionEvent, SessionState};
use sonara::transport::ServerEvent;

fn started(id: &str) -> SessionEvent {
    SessionEvent::Server(ServerEvent::SessionStarted {
        session_id: Some(id.to_string()),
        language: None,
    })
}

fn transcription(text: &str, confidence: f32) -> SessionEvent {
    SessionEvent::Server(ServerEvent::Transcription {
        text: text.to_string(),
        confidence,
        is_final: None,
    })
}

fn server_error(message: &str) -> SessionEvent {
    SessionEvent::Server(ServerEvent::Error {
        message: Some(message.to_string()),
    })
}

fn connecting() -> SessionState {
    SessionState {
        phase: ConnectionPhase::Connecting,
        ..SessionState::default()
    }
}

#[test]
fn listening_is_only_reachable_through_session_started() {
    let mut state = connecting();
    assert_ne!(state.phase, ConnectionPhase::Listening);

    let followup = state.apply(started("abc"));
    assert_eq!(followup, Followup::None);
    assert_eq!(state.phase, ConnectionPhase::Listening);
    assert_eq!(state.session_id.as_deref(), Some("abc"));
    assert!(state.last_error.is_none());
}

#[test]
fn live_scenario_start_then_transcribe() {
    let mut state = connecting();
    state.apply(started("abc"));
    state.apply(transcription("xin chào", 0.9));

    assert_eq!(state.transcript, "xin chào");
    assert!((state.confidence - 0.9).abs() < 1e-6);
    assert_eq!(state.session_id.as_deref(), Some("abc"));
    assert_eq!(state.phase, ConnectionPhase::Listening);
}

#[test]
fn transcription_replaces_text_and_confidence_together() {
    let mut state = connecting();
    state.apply(started("abc"));
    state.apply(transcription("first pass", 0.7));

    // An empty-text update still replaces both fields.
    state.apply(transcription("", 0.3));
    assert_eq!(state.transcript, "");
    assert!((state.confidence - 0.3).abs() < 1e-6);
}

#[test]
fn error_scenario_forces_full_teardown() {
    let mut state = connecting();
    state.apply(started("abc"));

    let followup = state.apply(server_error("mic busy"));
    assert_eq!(followup, Followup::ReleaseHandles);
    assert_eq!(state.last_error.as_deref(), Some("mic busy"));
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state.session_id.is_none());
    assert_eq!(state.audio_level, 0.0);
}

#[test]
fn error_without_message_still_tears_down() {
    let mut state = connecting();
    let followup = state.apply(SessionEvent::Server(ServerEvent::Error { message: None }));

    assert_eq!(followup, Followup::ReleaseHandles);
    assert!(state.last_error.is_some());
    assert_eq!(state.phase, ConnectionPhase::Idle);
}

#[test]
fn session_ended_clears_id_and_releases_handles() {
    let mut state = connecting();
    state.apply(started("abc"));
    state.apply(transcription("still visible", 0.8));

    let followup = state.apply(SessionEvent::Server(ServerEvent::SessionEnded {
        session_id: Some("abc".to_string()),
    }));
    assert_eq!(followup, Followup::ReleaseHandles);
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state.session_id.is_none());
    // The last transcript stays on screen after the session ends.
    assert_eq!(state.transcript, "still visible");
}

#[test]
fn transport_failure_surfaces_as_last_error() {
    let mut state = connecting();
    state.apply(started("abc"));

    let followup = state.apply(SessionEvent::TransportFailed(
        "gave up after 5 reconnect attempts".to_string(),
    ));
    assert_eq!(followup, Followup::ReleaseHandles);
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state
        .last_error
        .as_deref()
        .unwrap()
        .contains("5 reconnect attempts"));
}

#[test]
fn capture_failure_surfaces_as_last_error() {
    let mut state = connecting();
    state.apply(started("abc"));

    let followup = state.apply(SessionEvent::CaptureFailed("device unplugged".to_string()));
    assert_eq!(followup, Followup::ReleaseHandles);
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert_eq!(state.last_error.as_deref(), Some("device unplugged"));
}

#[test]
fn level_updates_only_apply_while_listening() {
    let mut state = connecting();
    state.apply(SessionEvent::Level(42.0));
    assert_eq!(state.audio_level, 0.0);

    state.apply(started("abc"));
    state.apply(SessionEvent::Level(42.0));
    assert_eq!(state.audio_level, 42.0);
}

#[test]
fn level_updates_are_clamped() {
    let mut state = connecting();
    state.apply(started("abc"));

    state.apply(SessionEvent::Level(150.0));
    assert_eq!(state.audio_level, 100.0);

    state.apply(SessionEvent::Level(-3.0));
    assert_eq!(state.audio_level, 0.0);
}

#[test]
fn reconnected_session_keeps_stale_id_until_replaced() {
    let mut state = connecting();
    state.apply(started("first"));

    // A reconnect may yield a fresh session id from the backend.
    state.apply(started("second"));
    assert_eq!(state.session_id.as_deref(), Some("second"));
    assert_eq!(state.phase, ConnectionPhase::Listening);
}
