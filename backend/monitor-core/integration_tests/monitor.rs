use crate::helpers::{
    SESSION_FRAME, accept_monitor, app_state, identify, is_silent, next_json, next_text,
    send_text, set_name, start_inspector, wait_for_phase,
};

use monitor_core::error::config::ConfigError;
use monitor_core::{
    AnySerializable, CommandParser, ConnectionPhase, MonitorConfig, MonitorMode,
    MonitorProvider, PipelineCommand, ReduxMonitor,
};

use std::time::Duration;

use serde::ser::Error as SerError;
use serde::{Serialize, Serializer};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

const SILENCE: Duration = Duration::from_millis(200);

fn monitor_for(url: &str, mode: MonitorMode) -> ReduxMonitor {
    let mut config = MonitorConfig::with_url(url);
    config.mode = mode;
    ReduxMonitor::new(config).expect("Failed to build monitor")
}

/// A state whose wire form always fails to encode.
struct BrokenState;

impl Serialize for BrokenState {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("state cannot be encoded"))
    }
}

fn record(monitor: &ReduxMonitor, payload: &str) {
    monitor.add_task(
        AnySerializable::new(set_name(payload)),
        AnySerializable::new(app_state(payload)),
    );
}

/// **VALUE**: Verifies the full happy path from connect to one streamed action.
///
/// **WHY THIS MATTERS**: This is the monitor's whole reason to exist. The inspection
/// tool must see the handshake first, then a `log` frame whose payload is the state
/// and whose action type is the action's type name.
#[tokio::test]
async fn given_identified_session_when_action_recorded_then_log_frame_sent() {
    // GIVEN: A fake inspector and a connected monitor
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;

    // WHEN: The handshake is answered with a session identity
    let handshake = identify(&mut ws).await;
    assert_eq!(handshake, json!({"event": "#handshake", "data": {}, "cid": 1}));
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;

    // WHEN: An action is recorded
    record(&monitor, "Andy");

    // THEN: One log frame carries the state, the type name and the session id
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["event"], "log");
    assert_eq!(frame["cid"], 2);
    assert_eq!(frame["data"]["payload"], json!({"name": "Andy"}));
    assert_eq!(frame["data"]["action"]["action"]["type"], "SetName");
    assert_eq!(
        frame["data"]["action"]["action"]["action"],
        json!({"payload": "Andy"})
    );
    assert!(frame["data"]["action"]["timeStamp"].as_f64().is_some());
    assert_eq!(frame["data"]["id"], "S1");
    assert_eq!(frame["data"]["type"], "ACTION");
    assert_eq!(monitor.session_id().await.as_deref(), Some("S1"));
}

/// **VALUE**: Verifies that events recorded before identification are held, then flushed in order.
///
/// **BUG THIS CATCHES**: Would catch the queue opening on transport-open instead of on
/// identity, or dropping events recorded during the handshake.
#[tokio::test]
async fn given_events_before_identity_when_identity_arrives_then_both_sent_in_order() {
    // GIVEN: A connected monitor with two events recorded before any identity
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    record(&monitor, "Hanna");
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    record(&monitor, "Moa");

    // THEN: Only the handshake arrives while unidentified
    let handshake = next_json(&mut ws).await;
    assert_eq!(handshake["event"], "#handshake");
    assert!(is_silent(&mut ws, SILENCE).await, "No log frames before identity");
    assert!(monitor.is_queue_suspended());

    // WHEN: The session identity arrives
    send_text(&mut ws, SESSION_FRAME).await;

    // THEN: Exactly two log frames arrive in recording order
    let first = next_json(&mut ws).await;
    let second = next_json(&mut ws).await;
    assert_eq!(first["data"]["payload"]["name"], "Hanna");
    assert_eq!(second["data"]["payload"]["name"], "Moa");
    assert!(is_silent(&mut ws, SILENCE).await);
}

#[tokio::test]
async fn given_many_events_when_streamed_then_cids_strictly_increase_in_order() {
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;

    let names = ["Peter", "Ruby", "Tom", "Marcus", "Simon", "Jenny"];
    for name in names {
        record(&monitor, name);
    }

    let mut last_cid = 1;
    for name in names {
        let frame = next_json(&mut ws).await;
        let cid = frame["cid"].as_i64().expect("cid");
        assert!(cid > last_cid, "cid {cid} must exceed {last_cid}");
        assert_eq!(frame["data"]["payload"]["name"], name);
        last_cid = cid;
    }
}

/// **VALUE**: Verifies the keepalive reply and that it leaves the session untouched.
#[tokio::test]
async fn given_streaming_when_ping_received_then_pong_sent_and_session_unchanged() {
    // GIVEN: An identified session
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;

    // WHEN: The transport pings
    send_text(&mut ws, "#1").await;

    // THEN: Exactly one "#2" comes back and the session is still S1
    assert_eq!(next_text(&mut ws).await, "#2");
    assert!(is_silent(&mut ws, SILENCE).await);
    assert_eq!(monitor.session_id().await.as_deref(), Some("S1"));
    assert_eq!(monitor.phase().await, ConnectionPhase::Streaming);
}

#[tokio::test]
async fn given_awaiting_session_when_ping_received_then_pong_sent_and_queue_stays_closed() {
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    record(&monitor, "Mary");
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    next_json(&mut ws).await;

    send_text(&mut ws, "#1").await;

    assert_eq!(next_text(&mut ws).await, "#2");
    assert!(is_silent(&mut ws, SILENCE).await);
    assert_eq!(monitor.session_id().await, None);
}

#[tokio::test]
async fn given_bidirectional_when_identified_then_login_precedes_log_frames() {
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Bidirectional);
    record(&monitor, "Zlatan");
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;

    identify(&mut ws).await;

    assert_eq!(
        next_json(&mut ws).await,
        json!({"event": "login", "data": "master"})
    );
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["event"], "log");
    assert_eq!(frame["data"]["payload"]["name"], "Zlatan");
}

/// **VALUE**: Verifies remote commands reach the pipeline's own channel, decoded.
///
/// **WHY THIS MATTERS**: Replay and time travel are the bidirectional variant's only
/// features. Commands must arrive as typed pipeline commands on the pipeline's side
/// of a channel, never applied from the socket task directly.
#[tokio::test]
async fn given_bidirectional_streaming_when_commands_received_then_pipeline_gets_them() {
    // GIVEN: A bidirectional monitor wired to a pipeline channel
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Bidirectional);
    let (pipeline_tx, mut pipeline_rx) = mpsc::unbounded_channel();
    let handler = CommandParser::<crate::helpers::AppState, crate::helpers::SetName>::new(
        pipeline_tx,
    )
    .into_handler();
    monitor.set_command_handler(move |command| handler(command));
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;
    next_json(&mut ws).await; // login
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;

    // WHEN: The tool replays an action and then jumps to a state
    send_text(
        &mut ws,
        r#"{"event":"respond","data":{"type":"ACTION","action":"{\"payload\":\"Tom\"}"}}"#,
    )
    .await;
    send_text(
        &mut ws,
        r#"{"event":"respond","data":{"type":"DISPATCH","action":{"type":"JUMP_TO_STATE"},"state":"{\"name\":\"Moa\"}"},"cid":3}"#,
    )
    .await;

    // THEN: Both arrive on the pipeline channel, decoded and in order
    let first = timeout(Duration::from_secs(3), pipeline_rx.recv())
        .await
        .expect("timed out")
        .expect("closed");
    let second = timeout(Duration::from_secs(3), pipeline_rx.recv())
        .await
        .expect("timed out")
        .expect("closed");
    assert_eq!(first, PipelineCommand::Dispatch(set_name("Tom")));
    assert_eq!(second, PipelineCommand::SetState(app_state("Moa")));
}

#[tokio::test]
async fn given_unidirectional_when_command_received_then_ignored() {
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    let (pipeline_tx, mut pipeline_rx) = mpsc::unbounded_channel();
    let handler = CommandParser::<crate::helpers::AppState, crate::helpers::SetName>::new(
        pipeline_tx,
    )
    .into_handler();
    monitor.set_command_handler(move |command| handler(command));
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;

    send_text(
        &mut ws,
        r#"{"event":"respond","data":{"type":"ACTION","action":"{\"payload\":\"Tom\"}"}}"#,
    )
    .await;
    send_text(&mut ws, "#1").await;
    assert_eq!(next_text(&mut ws).await, "#2");

    assert!(pipeline_rx.try_recv().is_err());
}

/// **VALUE**: Verifies teardown when the inspection tool goes away.
///
/// **BUG THIS CATCHES**: Would catch a stale session id surviving a closed socket, which
/// would tag later frames with a session the tool no longer knows.
#[tokio::test]
async fn given_streaming_when_inspector_closes_then_session_cleared_and_queue_suspended() {
    // GIVEN: An identified session
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;
    assert!(!monitor.is_queue_suspended());

    // WHEN: The inspector closes the socket
    ws.close(None).await.expect("close");
    drop(ws);

    // THEN: The monitor is closed with no session and a suspended queue
    wait_for_phase(&monitor, ConnectionPhase::Closed).await;
    assert_eq!(monitor.session_id().await, None);
    assert!(monitor.is_queue_suspended());

    // THEN: Recording keeps working without a transport
    record(&monitor, "Andy");
}

#[tokio::test]
async fn given_unreachable_inspector_when_connecting_then_monitor_ends_closed() {
    let (listener, url) = start_inspector().await;
    drop(listener);
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);

    monitor.connect();

    wait_for_phase(&monitor, ConnectionPhase::Closed).await;
    assert!(monitor.is_queue_suspended());
}

#[tokio::test]
async fn given_started_monitor_when_connect_called_again_then_no_second_connection() {
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);

    monitor.connect();
    monitor.connect();
    let _ws = accept_monitor(&listener).await;

    let second = timeout(SILENCE, listener.accept()).await;
    assert!(second.is_err(), "connect() must be idempotent");
}

#[test]
fn given_config_without_url_when_monitor_built_then_missing_url_error() {
    let mut config = MonitorConfig::default();
    config.url = None;

    let result = ReduxMonitor::new(config);

    assert!(matches!(result, Err(ConfigError::MissingUrl { .. })));
}

#[test]
fn given_non_websocket_url_when_monitor_built_then_validation_error() {
    let result = ReduxMonitor::new(MonitorConfig::with_url("ftp://127.0.0.1/"));

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn given_monitor_when_url_read_then_returns_configured_target() {
    let monitor = ReduxMonitor::new(MonitorConfig::with_url("ws://127.0.0.1:8000/socketcluster/"))
        .expect("monitor");

    assert_eq!(
        monitor.url().map(|url| url.as_str()),
        Some("ws://127.0.0.1:8000/socketcluster/")
    );
}

/// **VALUE**: Verifies that an event failing to encode is dropped alone.
///
/// **BUG THIS CATCHES**: Would catch the queue worker stopping after an encode error,
/// which would silently end streaming for the rest of the session.
#[tokio::test]
async fn given_unencodable_event_when_followed_by_valid_event_then_only_valid_frame_sent() {
    // GIVEN: A streaming monitor
    let (listener, url) = start_inspector().await;
    let monitor = monitor_for(&url, MonitorMode::Unidirectional);
    monitor.connect();
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;

    // WHEN: An event whose state fails to encode is recorded, then a valid one
    monitor.add_task(
        AnySerializable::new(set_name("A")),
        AnySerializable::new(BrokenState),
    );
    record(&monitor, "B");

    // THEN: Only the valid event reaches the inspector
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["event"], "log");
    assert_eq!(frame["data"]["payload"], json!({"name": "B"}));
    assert!(is_silent(&mut ws, SILENCE).await, "Broken event must not be sent");

    // AND: The session is unaffected
    assert_eq!(monitor.phase().await, ConnectionPhase::Streaming);
}
