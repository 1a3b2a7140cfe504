use crate::serializable::AnySerializable;

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

const HANDSHAKE_EVENT: &str = "#handshake";
const LOGIN_EVENT: &str = "login";
const LOG_EVENT: &str = "log";
const ACTION_EVENT_TYPE: &str = "ACTION";

/// First frame after the transport opens.
#[derive(Debug, Clone, Serialize)]
pub struct Handshake {
    pub event: &'static str,
    pub data: BTreeMap<String, String>,
    pub cid: i64,
}

impl Handshake {
    pub fn new(cid: i64) -> Self {
        Self {
            event: HANDSHAKE_EVENT,
            data: BTreeMap::new(),
            cid,
        }
    }
}

/// Sent once per session in bidirectional mode, before the queue opens.
#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub event: &'static str,
    pub data: String,
}

impl Login {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            event: LOGIN_EVENT,
            data: role.into(),
        }
    }
}

/// One recorded action and its resulting state, ready for the wire.
#[derive(Debug, Clone, Serialize)]
pub struct EmitObject {
    pub event: &'static str,
    pub cid: i64,
    pub data: MonitorEvent,
}

impl EmitObject {
    pub fn new(cid: i64, data: MonitorEvent) -> Self {
        Self {
            event: LOG_EVENT,
            cid,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorEvent {
    pub action: ActionObject,
    pub payload: AnySerializable,
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: &'static str,
}

impl MonitorEvent {
    pub fn new(action: ActionObject, payload: AnySerializable, id: impl Into<String>) -> Self {
        Self {
            action,
            payload,
            id: id.into(),
            event_type: ACTION_EVENT_TYPE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionObject {
    pub action: ReduxAction,
    /// Wall-clock seconds since the Unix epoch.
    #[serde(rename = "timeStamp")]
    pub time_stamp: f64,
}

impl ActionObject {
    pub fn new(action: AnySerializable, time_stamp: f64) -> Self {
        Self {
            action: ReduxAction::new(action),
            time_stamp,
        }
    }
}

/// The action value plus its dynamic type name.
///
/// `type` is derived from the wrapped value at serialization time; it is a
/// display label for the inspection tool only.
#[derive(Debug, Clone)]
pub struct ReduxAction {
    pub action: AnySerializable,
}

impl ReduxAction {
    pub fn new(action: AnySerializable) -> Self {
        Self { action }
    }

    pub fn type_name(&self) -> Cow<'static, str> {
        self.action.type_name()
    }
}

impl Serialize for ReduxAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ReduxAction", 2)?;
        state.serialize_field("action", &self.action)?;
        state.serialize_field("type", &self.type_name())?;
        state.end()
    }
}
