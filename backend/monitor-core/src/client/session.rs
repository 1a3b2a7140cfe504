//! Connection and handshake state machine.
//!
//! [`SessionMachine`] holds no I/O. Each transport event goes in, a list of
//! [`Effect`]s comes out, and the connection task performs them in order. This
//! keeps every transition testable without a socket.
//!
//! ```text
//! Disconnected -> Connecting -> AwaitingSession -> (LoggingIn ->) Streaming
//!       any state --transport close/error--> Closed
//! ```

use crate::client::frame::{InboundFrame, classify};
use crate::config::MonitorMode;
use crate::envelope::{Handshake, Login, MonitorCommand, PONG_FRAME, SessionIdentity};
use crate::error::serialization::SerializationError;

use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    AwaitingSession,
    LoggingIn,
    Streaming,
    Closed,
}

/// Control frames the state machine asks to send.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Handshake(Handshake),
    Login(Login),
    Pong,
}

impl OutboundFrame {
    /// Text payload for the transport.
    pub fn encode(&self) -> Result<String, SerializationError> {
        let text = match self {
            OutboundFrame::Handshake(handshake) => serde_json::to_string(handshake)?,
            OutboundFrame::Login(login) => serde_json::to_string(login)?,
            OutboundFrame::Pong => PONG_FRAME.to_string(),
        };
        Ok(text)
    }
}

/// Work the connection task performs after a transition.
#[derive(Debug, Clone)]
pub enum Effect {
    Send(OutboundFrame),
    ResumeQueue,
    SuspendQueue,
    Command(MonitorCommand),
}

#[derive(Debug)]
pub struct SessionMachine {
    mode: MonitorMode,
    login_role: String,
    phase: ConnectionPhase,
    identity: Option<SessionIdentity>,
}

impl SessionMachine {
    pub fn new(mode: MonitorMode, login_role: impl Into<String>) -> Self {
        Self {
            mode,
            login_role: login_role.into(),
            phase: ConnectionPhase::Disconnected,
            identity: None,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    /// The transport is being opened.
    pub fn begin_connect(&mut self) {
        self.phase = ConnectionPhase::Connecting;
    }

    /// The transport is open: send the handshake and wait for a session.
    pub fn on_open(&mut self, cid: i64) -> Vec<Effect> {
        self.phase = ConnectionPhase::AwaitingSession;
        self.identity = None;
        vec![Effect::Send(OutboundFrame::Handshake(Handshake::new(cid)))]
    }

    /// Handle one inbound text frame.
    pub fn on_text(&mut self, text: &str) -> Vec<Effect> {
        let accept_commands =
            self.mode == MonitorMode::Bidirectional && self.phase == ConnectionPhase::Streaming;

        match classify(text, accept_commands) {
            InboundFrame::Ping => vec![Effect::Send(OutboundFrame::Pong)],
            InboundFrame::Session(record) => self.identify(record.data),
            InboundFrame::Command(frame) => {
                debug!("Monitor command received on event '{}'", frame.event);
                vec![Effect::Command(frame.data)]
            }
            InboundFrame::Unrecognized => {
                debug!("Ignoring unrecognized monitor frame: {text}");
                Vec::new()
            }
        }
    }

    /// The transport closed or failed. Session state is discarded.
    pub fn on_close(&mut self) -> Vec<Effect> {
        self.phase = ConnectionPhase::Closed;
        self.identity = None;
        vec![Effect::SuspendQueue]
    }

    fn identify(&mut self, identity: SessionIdentity) -> Vec<Effect> {
        if self.phase == ConnectionPhase::Streaming {
            debug!("Session re-identified as {}", identity.id);
            self.identity = Some(identity);
            return Vec::new();
        }

        info!(
            "Session identified: id={}, authenticated={}, ping_timeout={}ms",
            identity.id, identity.is_authenticated, identity.ping_timeout_ms
        );
        self.identity = Some(identity);

        let mut effects = Vec::with_capacity(2);
        if self.mode == MonitorMode::Bidirectional {
            self.phase = ConnectionPhase::LoggingIn;
            effects.push(Effect::Send(OutboundFrame::Login(Login::new(
                self.login_role.clone(),
            ))));
        }

        self.phase = ConnectionPhase::Streaming;
        effects.push(Effect::ResumeQueue);
        effects
    }
}
