//! Test helpers for store integration tests.
//!
//! - A monitor that records what the middleware hands it
//! - A minimal fake inspection tool for the live end-to-end case

use monitor_demo::store::{AppState, RemoteCommand, Store};

use monitor_core::{AnySerializable, MonitorMiddleware, MonitorProvider};

use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use log::Level;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use url::Url;

pub const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Default)]
pub struct RecordingMonitor {
    pub tasks: Mutex<Vec<(Value, Value)>>,
    pub warnings: Mutex<Vec<String>>,
}

impl RecordingMonitor {
    pub fn tasks(&self) -> Vec<(Value, Value)> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl MonitorProvider for RecordingMonitor {
    fn url(&self) -> Option<&Url> {
        None
    }

    fn connect(&self) {}

    fn log(&self, message: &str, detail: &dyn Display, level: Level) {
        if level == Level::Warn {
            self.warnings
                .lock()
                .unwrap()
                .push(format!("{message} {detail}"));
        }
    }

    fn add_task(&self, action: AnySerializable, state: AnySerializable) {
        self.tasks
            .lock()
            .unwrap()
            .push((action.to_wire().unwrap(), state.to_wire().unwrap()));
    }
}

/// Test helper: Spawn a store whose middleware records into the returned monitor.
pub fn recording_store() -> (
    Store,
    Arc<RecordingMonitor>,
    mpsc::UnboundedSender<RemoteCommand>,
) {
    let monitor = Arc::new(RecordingMonitor::default());
    let (remote_tx, remote_rx) = mpsc::unbounded_channel();
    let middleware = MonitorMiddleware::new(monitor.clone());
    let store = Store::spawn(AppState::default(), middleware, remote_rx);
    (store, monitor, remote_tx)
}

/// Test helper: Bind a fake inspection tool and return it with its ws:// url.
pub async fn start_inspector() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake inspector");
    let address = listener.local_addr().expect("local addr");
    (listener, format!("ws://{address}/socketcluster/?transport=websocket"))
}

/// Test helper: Accept the monitor's WebSocket connection.
pub async fn accept_monitor(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(FRAME_TIMEOUT, listener.accept())
        .await
        .expect("Monitor did not connect")
        .expect("Accept failed");
    accept_async(stream).await.expect("WebSocket handshake failed")
}

/// Test helper: Next text frame from the monitor, parsed as JSON.
pub async fn next_json(socket: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let message = timeout(FRAME_TIMEOUT, socket.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Socket ended")
            .expect("Socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
        }
    }
}

/// Test helper: Poll until the store's name matches, or give up.
pub async fn wait_for_name(store: &Store, expected: &str) -> bool {
    for _ in 0..100 {
        if store.state().await.name == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
