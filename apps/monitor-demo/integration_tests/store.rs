use crate::helpers::{accept_monitor, next_json, recording_store, start_inspector, wait_for_name};

use monitor_demo::store::{AppState, OnNameChange, SetName, Store, StoreInit};

use monitor_core::{
    CommandParser, MonitorConfig, MonitorMiddleware, MonitorMode, PipelineCommand, ReduxMonitor,
};

use std::sync::Arc;

use futures_util::SinkExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// **VALUE**: Verifies that the middleware sees the state after the reducer ran.
///
/// **BUG THIS CATCHES**: Would catch the store observing before reducing, which
/// would stream every action paired with the previous state.
#[tokio::test]
async fn given_recording_monitor_when_dispatching_then_records_action_and_new_state() {
    // GIVEN: A store with a recording monitor
    let (store, monitor, _remote) = recording_store();

    // WHEN: Init then one rename
    store.dispatch(StoreInit::default()).unwrap();
    store.dispatch(SetName::new("Ruby")).unwrap();
    store.flush().await.unwrap();

    // THEN: Both transitions recorded in order with post-reduce state
    assert_eq!(
        monitor.tasks(),
        vec![
            (json!({"name": "StoreInit"}), json!({"name": "Andy"})),
            (json!({"payload": "Ruby"}), json!({"name": "Ruby"})),
        ]
    );
}

/// **VALUE**: Verifies that an unserializable action is applied but only warned about.
#[tokio::test]
async fn given_listener_action_when_dispatched_then_warns_and_records_nothing() {
    // GIVEN: A store with a recording monitor
    let (store, monitor, _remote) = recording_store();

    // WHEN: Dispatching an action that carries a closure
    store
        .dispatch(OnNameChange {
            callback: Box::new(|_| {}),
        })
        .unwrap();
    store.flush().await.unwrap();

    // THEN: One warning naming the action, no task
    assert!(monitor.tasks().is_empty());
    let warnings = monitor.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("OnNameChange"), "got {warnings:?}");
}

/// **VALUE**: Verifies that a remote jump replaces the state without being recorded.
///
/// **BUG THIS CATCHES**: Would catch remote SetState being fed back through the
/// middleware, which would echo every time-travel step to the inspection tool.
#[tokio::test]
async fn given_remote_set_state_then_state_replaced_and_not_recorded() {
    // GIVEN: A store with a recording monitor
    let (store, monitor, remote) = recording_store();

    // WHEN: The inspection tool jumps to a state
    remote
        .send(PipelineCommand::SetState(AppState {
            name: "Zlatan".to_string(),
        }))
        .unwrap();

    // THEN: State replaced, nothing recorded
    assert!(wait_for_name(&store, "Zlatan").await, "Remote jump not applied");
    store.flush().await.unwrap();
    assert!(monitor.tasks().is_empty());
}

/// **VALUE**: Verifies that a remote action is reduced and recorded like a local one.
#[tokio::test]
async fn given_remote_dispatch_then_applied_and_recorded() {
    // GIVEN: A store with a recording monitor
    let (store, monitor, remote) = recording_store();

    // WHEN: The inspection tool dispatches an action
    remote
        .send(PipelineCommand::Dispatch(SetName::new("Jenny")))
        .unwrap();

    // THEN: Applied and recorded
    assert!(wait_for_name(&store, "Jenny").await, "Remote action not applied");
    store.flush().await.unwrap();
    assert_eq!(
        monitor.tasks(),
        vec![(json!({"payload": "Jenny"}), json!({"name": "Jenny"}))]
    );
}

/// **VALUE**: End to end: a live bidirectional monitor streams a local dispatch and
/// applies a remote jump sent back over the socket.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_live_monitor_when_inspector_jumps_then_store_follows() {
    // GIVEN: A fake inspection tool and a bidirectional monitor wired to a store
    let (listener, url) = start_inspector().await;
    let mut config = MonitorConfig::with_url(url);
    config.mode = MonitorMode::Bidirectional;
    let monitor = ReduxMonitor::new(config).unwrap();

    let (remote_tx, remote_rx) = mpsc::unbounded_channel();
    let parser = CommandParser::<AppState, SetName>::new(remote_tx);
    monitor.set_command_handler(move |command| parser.handle(command));

    let middleware = MonitorMiddleware::new(Arc::new(monitor));
    let store = Store::spawn(AppState::default(), middleware, remote_rx);

    let mut socket = accept_monitor(&listener).await;
    assert_eq!(next_json(&mut socket).await["event"], "#handshake");

    // WHEN: The tool identifies the session
    socket
        .send(Message::Text(
            r#"{"rid":1,"data":{"id":"S1","isAuthenticated":true,"pingTimeout":25000}}"#.into(),
        ))
        .await
        .unwrap();
    assert_eq!(next_json(&mut socket).await, json!({"event": "login", "data": "master"}));

    // AND: The host renames
    store.dispatch(SetName::new("Mary")).unwrap();

    // THEN: One log frame with the action and resulting state
    let frame = next_json(&mut socket).await;
    assert_eq!(frame["event"], "log");
    assert_eq!(frame["data"]["id"], "S1");
    assert_eq!(frame["data"]["action"]["action"]["action"], json!({"payload": "Mary"}));
    assert_eq!(frame["data"]["payload"], json!({"name": "Mary"}));

    // WHEN: The tool jumps back to an earlier state
    socket
        .send(Message::Text(
            json!({
                "event": "respond",
                "data": {"type": "DISPATCH", "action": {"type": "JUMP_TO_STATE"}, "state": "{\"name\":\"Andy\"}"}
            })
            .to_string()
            .into(),
        ))
        .await
        .unwrap();

    // THEN: The store follows
    assert!(
        wait_for_name(&store, "Andy").await,
        "Store should apply the remote jump"
    );
}
