use serde::Deserialize;
use serde_json::{Map, Value};

/// Session description sent by the transport right after the handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub rid: i64,
    pub data: SessionIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionIdentity {
    pub id: String,
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    #[serde(rename = "pingTimeout")]
    pub ping_timeout_ms: u64,
}

/// Envelope around a command sent back by the inspection tool.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorCommandFrame {
    pub event: String,
    pub data: MonitorCommand,
    #[serde(default)]
    pub cid: Option<i64>,
}

/// A remote instruction to replay an action or restore a captured state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum MonitorCommand {
    /// Restore `state`, a JSON document of the pipeline's state type.
    #[serde(rename = "DISPATCH")]
    JumpToState {
        action: Map<String, Value>,
        state: String,
    },

    /// Replay `action`, a JSON document of the pipeline's action type.
    #[serde(rename = "ACTION")]
    Action { action: String },
}
