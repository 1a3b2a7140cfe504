use crate::client::frame::{InboundFrame, classify};

const SESSION_FRAME: &str =
    r#"{"rid":1,"data":{"id":"S1","isAuthenticated":true,"pingTimeout":25000}}"#;
const ACTION_FRAME: &str =
    r#"{"event":"respond","data":{"type":"ACTION","action":"{\"payload\":\"Tom\"}"}}"#;

#[test]
fn given_ping_text_when_classified_then_is_ping() {
    assert!(matches!(classify("#1", true), InboundFrame::Ping));
}

#[test]
fn given_session_text_when_classified_then_is_session() {
    match classify(SESSION_FRAME, false) {
        InboundFrame::Session(record) => assert_eq!(record.data.id, "S1"),
        other => panic!("Expected Session, got {other:?}"),
    }
}

/// **VALUE**: Verifies that command frames are only decoded when commands are accepted.
///
/// **BUG THIS CATCHES**: Would catch a unidirectional monitor replaying actions
/// into the store because the inspection tool happened to send one.
#[test]
fn given_command_text_when_commands_not_accepted_then_is_unrecognized() {
    assert!(matches!(
        classify(ACTION_FRAME, false),
        InboundFrame::Unrecognized
    ));
    assert!(matches!(
        classify(ACTION_FRAME, true),
        InboundFrame::Command(_)
    ));
}

#[test]
fn given_malformed_text_when_classified_then_is_unrecognized() {
    for text in ["", "#2", "not json", "{\"rid\":1}", "[1,2,3]", "{\"event\":\"x\"}"] {
        assert!(
            matches!(classify(text, true), InboundFrame::Unrecognized),
            "{text:?} should be unrecognized"
        );
    }
}
