use crate::store::{AppState, OnNameChange, SetName, Store, StoreInit};

use monitor_core::{MonitorMiddleware, MonitorMock, Monitored};

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

fn mock_store() -> (Store, mpsc::UnboundedSender<crate::store::RemoteCommand>) {
    let (remote_tx, remote_rx) = mpsc::unbounded_channel();
    let middleware = MonitorMiddleware::new(Arc::new(MonitorMock::new()));
    (
        Store::spawn(AppState::default(), middleware, remote_rx),
        remote_tx,
    )
}

/// **VALUE**: Verifies that a dispatched SetName reaches the state.
#[tokio::test]
async fn given_store_when_set_name_dispatched_then_state_updates() {
    // GIVEN: A store with the default state
    let (store, _remote) = mock_store();
    assert_eq!(store.state().await.name, "Andy");

    // WHEN: Dispatching and flushing
    store.dispatch(SetName::new("Hanna")).unwrap();
    store.flush().await.unwrap();

    // THEN: The name changed
    assert_eq!(store.state().await.name, "Hanna");
}

/// **VALUE**: Verifies that actions are reduced in dispatch order.
#[tokio::test]
async fn given_listener_when_names_dispatched_then_sees_each_in_order() {
    // GIVEN: A listener action queued between two renames
    let (store, _remote) = mock_store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    // WHEN: Dispatching rename, listener, rename, listener
    store.dispatch(SetName::new("Moa")).unwrap();
    let first = Arc::clone(&sink);
    store
        .dispatch(OnNameChange {
            callback: Box::new(move |name| first.lock().unwrap().push(name.to_string())),
        })
        .unwrap();
    store.dispatch(SetName::new("Peter")).unwrap();
    store
        .dispatch(OnNameChange {
            callback: Box::new(move |name| sink.lock().unwrap().push(name.to_string())),
        })
        .unwrap();
    store.flush().await.unwrap();

    // THEN: Each listener saw the state as of its own position
    assert_eq!(*seen.lock().unwrap(), vec!["Moa", "Peter"]);
}

/// **VALUE**: Verifies that the init action carries its name and leaves state alone.
#[tokio::test]
async fn given_store_init_then_state_unchanged_and_snapshot_names_itself() {
    // GIVEN: A fresh store
    let (store, _remote) = mock_store();

    // WHEN: Dispatching StoreInit
    store.dispatch(StoreInit::default()).unwrap();
    store.flush().await.unwrap();

    // THEN: State unchanged, snapshot is {"name":"StoreInit"}
    assert_eq!(store.state().await, AppState::default());
    let wire = StoreInit::default().snapshot().unwrap().to_wire().unwrap();
    assert_eq!(wire, serde_json::json!({"name": "StoreInit"}));
}

/// **VALUE**: Verifies that a listener action is never offered to the monitor.
#[test]
fn given_listener_action_then_has_no_snapshot() {
    let action = OnNameChange {
        callback: Box::new(|_| {}),
    };
    assert!(action.snapshot().is_none());
    assert_eq!(action.type_name(), "OnNameChange");
}
