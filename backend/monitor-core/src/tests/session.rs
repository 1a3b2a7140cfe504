use crate::client::session::{ConnectionPhase, Effect, OutboundFrame, SessionMachine};
use crate::config::MonitorMode;
use crate::envelope::MonitorCommand;

const SESSION_FRAME: &str =
    r#"{"rid":1,"data":{"id":"S1","isAuthenticated":true,"pingTimeout":25000}}"#;
const DISPATCH_FRAME: &str = r#"{"event":"respond","data":{"type":"DISPATCH","action":{"type":"JUMP_TO_STATE"},"state":"{\"name\":\"Moa\"}"}}"#;

fn opened(mode: MonitorMode) -> SessionMachine {
    let mut machine = SessionMachine::new(mode, "master");
    machine.begin_connect();
    machine.on_open(1);
    machine
}

fn encoded(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Send(frame) => Some(frame.encode().expect("encode")),
            _ => None,
        })
        .collect()
}

#[test]
fn given_new_machine_when_opened_then_sends_handshake_and_awaits_session() {
    // GIVEN: A machine that is connecting
    let mut machine = SessionMachine::new(MonitorMode::Unidirectional, "master");
    assert_eq!(machine.phase(), ConnectionPhase::Disconnected);
    machine.begin_connect();
    assert_eq!(machine.phase(), ConnectionPhase::Connecting);

    // WHEN: The transport opens
    let effects = machine.on_open(5);

    // THEN: Exactly one handshake with the given cid goes out
    assert_eq!(
        encoded(&effects),
        vec![r##"{"event":"#handshake","data":{},"cid":5}"##.to_string()]
    );
    assert_eq!(machine.phase(), ConnectionPhase::AwaitingSession);
}

/// **VALUE**: Verifies the keepalive exchange has no side effects.
///
/// **WHY THIS MATTERS**: The transport pings throughout a session; treating a ping as a
/// session frame or a command would reset the session or dispatch garbage.
#[test]
fn given_any_phase_when_ping_received_then_only_pong_is_sent() {
    for mode in [MonitorMode::Unidirectional, MonitorMode::Bidirectional] {
        let mut machine = opened(mode);
        machine.on_text(SESSION_FRAME);
        let phase_before = machine.phase();

        let effects = machine.on_text("#1");

        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Send(OutboundFrame::Pong)));
        assert_eq!(encoded(&effects), vec!["#2".to_string()]);
        assert_eq!(machine.phase(), phase_before);
        assert_eq!(machine.session_id(), Some("S1"));
    }
}

#[test]
fn given_awaiting_session_when_ping_received_then_still_awaiting() {
    let mut machine = opened(MonitorMode::Unidirectional);

    machine.on_text("#1");

    assert_eq!(machine.phase(), ConnectionPhase::AwaitingSession);
    assert_eq!(machine.session_id(), None);
}

#[test]
fn given_unidirectional_when_session_identified_then_streams_without_login() {
    let mut machine = opened(MonitorMode::Unidirectional);

    let effects = machine.on_text(SESSION_FRAME);

    assert!(encoded(&effects).is_empty(), "No login in unidirectional mode");
    assert!(matches!(effects.as_slice(), [Effect::ResumeQueue]));
    assert_eq!(machine.phase(), ConnectionPhase::Streaming);
    assert_eq!(machine.session_id(), Some("S1"));
    let identity = machine.identity().expect("identity");
    assert!(identity.is_authenticated);
    assert_eq!(identity.ping_timeout_ms, 25000);
}

/// **VALUE**: Verifies the login frame goes out before the queue opens.
///
/// **BUG THIS CATCHES**: Would catch effects being reordered so that queued log frames
/// race ahead of the login, which the inspection tool rejects.
#[test]
fn given_bidirectional_when_session_identified_then_logs_in_before_resuming_queue() {
    let mut machine = opened(MonitorMode::Bidirectional);

    let effects = machine.on_text(SESSION_FRAME);

    assert_eq!(effects.len(), 2);
    assert!(matches!(effects[0], Effect::Send(OutboundFrame::Login(_))));
    assert!(matches!(effects[1], Effect::ResumeQueue));
    assert_eq!(
        encoded(&effects),
        vec![r#"{"event":"login","data":"master"}"#.to_string()]
    );
    assert_eq!(machine.phase(), ConnectionPhase::Streaming);
}

#[test]
fn given_streaming_when_session_frame_repeats_then_updates_id_without_login() {
    let mut machine = opened(MonitorMode::Bidirectional);
    machine.on_text(SESSION_FRAME);

    let effects =
        machine.on_text(r#"{"rid":2,"data":{"id":"S2","isAuthenticated":false,"pingTimeout":1}}"#);

    assert!(effects.is_empty());
    assert_eq!(machine.session_id(), Some("S2"));
    assert_eq!(machine.phase(), ConnectionPhase::Streaming);
}

#[test]
fn given_bidirectional_streaming_when_command_received_then_emits_command() {
    let mut machine = opened(MonitorMode::Bidirectional);
    machine.on_text(SESSION_FRAME);

    let effects = machine.on_text(DISPATCH_FRAME);

    match effects.as_slice() {
        [Effect::Command(MonitorCommand::JumpToState { state, .. })] => {
            assert_eq!(state, r#"{"name":"Moa"}"#);
        }
        other => panic!("Expected one JumpToState command, got {other:?}"),
    }
    assert_eq!(machine.phase(), ConnectionPhase::Streaming);
}

#[test]
fn given_command_before_streaming_or_unidirectional_when_received_then_ignored() {
    let mut awaiting = opened(MonitorMode::Bidirectional);
    assert!(awaiting.on_text(DISPATCH_FRAME).is_empty());

    let mut unidirectional = opened(MonitorMode::Unidirectional);
    unidirectional.on_text(SESSION_FRAME);
    assert!(unidirectional.on_text(DISPATCH_FRAME).is_empty());
}

#[test]
fn given_garbage_frame_when_received_then_no_effects_and_no_state_change() {
    let mut machine = opened(MonitorMode::Bidirectional);
    machine.on_text(SESSION_FRAME);

    assert!(machine.on_text("{\"unexpected\":true}").is_empty());
    assert!(machine.on_text("definitely not json").is_empty());
    assert_eq!(machine.phase(), ConnectionPhase::Streaming);
    assert_eq!(machine.session_id(), Some("S1"));
}

#[test]
fn given_streaming_when_closed_then_clears_identity_and_suspends_queue() {
    let mut machine = opened(MonitorMode::Unidirectional);
    machine.on_text(SESSION_FRAME);

    let effects = machine.on_close();

    assert!(matches!(effects.as_slice(), [Effect::SuspendQueue]));
    assert_eq!(machine.phase(), ConnectionPhase::Closed);
    assert_eq!(machine.session_id(), None);
}

#[test]
fn given_closed_when_reopened_then_awaits_new_session() {
    let mut machine = opened(MonitorMode::Unidirectional);
    machine.on_text(SESSION_FRAME);
    machine.on_close();

    machine.begin_connect();
    machine.on_open(9);

    assert_eq!(machine.phase(), ConnectionPhase::AwaitingSession);
    assert_eq!(machine.session_id(), None);
}
