use sonara::{ServerEvent, StreamConfig};

#[test]
fn test_config_frame_serialization() {
    let config = StreamConfig {
        language: "vi-VN".to_string(),
        participants: vec!["An".to_string(), "Binh".to_string()],
    };

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"language\":\"vi-VN\""));
    assert!(json.contains("\"participants\":[\"An\",\"Binh\"]"));

    let deserialized: StreamConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.language, "vi-VN");
    assert_eq!(deserialized.participants.len(), 2);
}

#[test]
fn test_config_frame_omits_empty_participants() {
    let config = StreamConfig {
        language: "en-US".to_string(),
        participants: Vec::new(),
    };

    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("participants"));
}

#[test]
fn test_session_started_deserialization() {
    // The backend also sends a human-readable message field; it is ignored.
    let json = r#"{
        "type": "session_started",
        "session_id": "abc",
        "language": "vi-VN",
        "message": "ok"
    }"#;

    let event: ServerEvent = serde_json::from_str(json).unwrap();
    match event {
        ServerEvent::SessionStarted {
            session_id,
            language,
        } => {
            assert_eq!(session_id.as_deref(), Some("abc"));
            assert_eq!(language.as_deref(), Some("vi-VN"));
        }
        other => panic!("expected session_started, got {other:?}"),
    }
}

#[test]
fn test_transcription_deserialization() {
    let json = r#"{
        "type": "transcription",
        "text": "xin chào",
        "confidence": 0.9,
        "is_final": true,
        "timestamp": "2025-11-02T14:30:05"
    }"#;

    let event: ServerEvent = serde_json::from_str(json).unwrap();
    match event {
        ServerEvent::Transcription {
            text,
            confidence,
            is_final,
        } => {
            assert_eq!(text, "xin chào");
            assert!((confidence - 0.9).abs() < 1e-6);
            assert_eq!(is_final, Some(true));
        }
        other => panic!("expected transcription, got {other:?}"),
    }
}

#[test]
fn test_transcription_defaults_for_sparse_frames() {
    let json = r#"{"type": "transcription"}"#;

    let event: ServerEvent = serde_json::from_str(json).unwrap();
    match event {
        ServerEvent::Transcription {
            text,
            confidence,
            is_final,
        } => {
            assert!(text.is_empty());
            assert_eq!(confidence, 0.0);
            assert_eq!(is_final, None);
        }
        other => panic!("expected transcription, got {other:?}"),
    }
}

#[test]
fn test_error_event_deserialization() {
    let json = r#"{"type": "error", "message": "mic busy"}"#;

    let event: ServerEvent = serde_json::from_str(json).unwrap();
    match event {
        ServerEvent::Error { message } => assert_eq!(message.as_deref(), Some("mic busy")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn test_session_ended_without_id() {
    let json = r#"{"type": "session_ended"}"#;

    let event: ServerEvent = serde_json::from_str(json).unwrap();
    assert!(matches!(event, ServerEvent::SessionEnded { session_id: None }));
}

#[test]
fn test_malformed_frames_fail_to_parse() {
    assert!(serde_json::from_str::<ServerEvent>("not json at all").is_err());
    assert!(serde_json::from_str::<ServerEvent>(r#"{"type": "bogus"}"#).is_err());
    assert!(serde_json::from_str::<ServerEvent>(r#"{"text": "no discriminant"}"#).is_err());
}
