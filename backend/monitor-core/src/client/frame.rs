//! Inbound frame classification.
//!
//! A text frame is tried against each record type in turn. Failing to decode is
//! not an error, it only means "not this record"; whatever matches nothing is
//! reported as [`InboundFrame::Unrecognized`].

use crate::envelope::{MonitorCommandFrame, PING_FRAME, SessionRecord};

#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// Transport keepalive.
    Ping,

    /// Session description assigned by the transport.
    Session(SessionRecord),

    /// Command from the inspection tool.
    Command(MonitorCommandFrame),

    Unrecognized,
}

/// Classify one text frame.
///
/// Commands are only decoded when `accept_commands` is set, i.e. in
/// bidirectional mode once the session is streaming.
pub fn classify(text: &str, accept_commands: bool) -> InboundFrame {
    if text == PING_FRAME {
        return InboundFrame::Ping;
    }

    if let Ok(record) = serde_json::from_str::<SessionRecord>(text) {
        return InboundFrame::Session(record);
    }

    if accept_commands
        && let Ok(command) = serde_json::from_str::<MonitorCommandFrame>(text)
    {
        return InboundFrame::Command(command);
    }

    InboundFrame::Unrecognized
}
