// Session command semantics that need no live backend or microphone:
// every failure path below is driven through a port that actively
// refuses connections.

use sonara::{ConnectionPhase, Endpoints, SessionConfig, SpeechSession};

/// Endpoints on a port that was bound and then released, so connection
/// attempts fail immediately.
async fn refused_endpoints() -> Endpoints {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Endpoints {
        stream_url: format!("ws://{addr}/api/transcription/live"),
        api_base: format!("http://{addr}"),
    }
}

async fn session() -> SpeechSession {
    SpeechSession::with_endpoints(SessionConfig::default(), refused_endpoints().await).unwrap()
}

#[tokio::test]
async fn start_failure_returns_to_idle_with_error() {
    let session = session().await;

    let result = session.start_listening().await;
    assert!(result.is_err());

    let state = session.snapshot().await;
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state.last_error.is_some());
    assert!(state.session_id.is_none());
    assert_eq!(state.audio_level, 0.0);
}

#[tokio::test]
async fn stop_when_idle_is_a_noop() {
    let session = session().await;

    session.stop_listening().await;
    session.stop_listening().await;

    let state = session.snapshot().await;
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state.last_error.is_none());
    assert!(state.transcript.is_empty());
}

#[tokio::test]
async fn clear_resets_transcript_and_error_but_not_phase() {
    let session = session().await;

    // Leave an error behind via a failed start.
    let _ = session.start_listening().await;
    assert!(session.snapshot().await.last_error.is_some());

    session.clear().await;

    let state = session.snapshot().await;
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state.last_error.is_none());
    assert!(state.transcript.is_empty());
    assert_eq!(state.confidence, 0.0);
}

#[tokio::test]
async fn upload_failure_sets_error_without_phase_change() {
    let session = session().await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_test_wav(&path);

    let result = session.upload_file(&path, None).await;
    assert!(result.is_err());

    let state = session.snapshot().await;
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state.last_error.is_some());
    assert!(state.transcript.is_empty());
}

#[tokio::test]
async fn upload_of_missing_file_sets_error() {
    let session = session().await;

    let result = session
        .upload_file(std::path::Path::new("does-not-exist.wav"), Some("en-US"))
        .await;
    assert!(result.is_err());
    assert!(session.snapshot().await.last_error.is_some());
}

#[tokio::test]
async fn failed_start_clears_previous_transcript() {
    let session = session().await;

    // A failed upload leaves an error; the next start must clear it
    // alongside the transcript before attempting to connect.
    let _ = session
        .upload_file(std::path::Path::new("does-not-exist.wav"), None)
        .await;
    assert!(session.snapshot().await.last_error.is_some());

    let _ = session.start_listening().await;

    // The start failed too, so last_error is set again, but the phase is
    // back to idle and nothing of the old session survived.
    let state = session.snapshot().await;
    assert_eq!(state.phase, ConnectionPhase::Idle);
    assert!(state.transcript.is_empty());
    assert!(state.session_id.is_none());
}

fn write_test_wav(path: &std::path::Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..1600 {
        writer.write_sample((i % 128) as i16).unwrap();
    }
    writer.finalize().unwrap();
}
