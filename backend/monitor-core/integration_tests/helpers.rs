//! Test helpers for monitor integration tests.
//!
//! This module provides a fake inspection tool:
//! - A WebSocket listener on an ephemeral localhost port
//! - Receiving text frames with a timeout
//! - Asserting that nothing was sent
//! - Polling the monitor's connection phase

use monitor_core::{AnySerializable, ConnectionPhase, Monitored, ReduxMonitor};

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

pub const SESSION_FRAME: &str =
    r#"{"rid":1,"data":{"id":"S1","isAuthenticated":true,"pingTimeout":25000}}"#;

const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

pub type InspectorSocket = WebSocketStream<TcpStream>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetName {
    pub payload: String,
}

impl Monitored for SetName {
    fn snapshot(&self) -> Option<AnySerializable> {
        Some(AnySerializable::new(self.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub name: String,
}

impl Monitored for AppState {
    fn snapshot(&self) -> Option<AnySerializable> {
        Some(AnySerializable::new(self.clone()))
    }
}

pub fn set_name(payload: &str) -> SetName {
    SetName {
        payload: payload.to_string(),
    }
}

pub fn app_state(name: &str) -> AppState {
    AppState {
        name: name.to_string(),
    }
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
pub async fn accept_monitor(listener: &TcpListener) -> InspectorSocket {
    let (stream, _) = timeout(FRAME_TIMEOUT, listener.accept())
        .await
        .expect("Monitor did not connect")
        .expect("Accept failed");
    accept_async(stream)
        .await
        .expect("WebSocket handshake failed")
}

/// Test helper: Receive the next text frame.
pub async fn next_text(ws: &mut InspectorSocket) -> String {
    loop {
        let message = timeout(FRAME_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for frame")
            .expect("Socket closed")
            .expect("Error receiving frame");

        if let Message::Text(text) = message {
            return text.as_str().to_owned();
        }
    }
}

/// Test helper: Receive the next text frame and decode it as JSON.
pub async fn next_json(ws: &mut InspectorSocket) -> Value {
    let text = next_text(ws).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Frame is not JSON ({e}): {text}"))
}

/// Test helper: Send a text frame to the monitor.
pub async fn send_text(ws: &mut InspectorSocket, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("Failed to send frame");
}

/// Test helper: Receive the handshake and answer with the session frame.
pub async fn identify(ws: &mut InspectorSocket) -> Value {
    let handshake = next_json(ws).await;
    send_text(ws, SESSION_FRAME).await;
    handshake
}

/// Test helper: True if no text frame arrives within `window`.
pub async fn is_silent(ws: &mut InspectorSocket, window: Duration) -> bool {
    match timeout(window, next_text(ws)).await {
        Err(_) => true,
        Ok(text) => {
            eprintln!("Unexpected frame: {text}");
            false
        }
    }
}

/// Test helper: Poll until the monitor reaches `phase`.
pub async fn wait_for_phase(monitor: &ReduxMonitor, phase: ConnectionPhase) {
    let deadline = Instant::now() + FRAME_TIMEOUT;
    while monitor.phase().await != phase {
        assert!(
            Instant::now() < deadline,
            "Monitor never reached {phase:?}, stuck in {:?}",
            monitor.phase().await
        );
        sleep(Duration::from_millis(10)).await;
    }
}
