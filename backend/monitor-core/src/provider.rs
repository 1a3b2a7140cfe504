//! The contract the pipeline depends on.
//!
//! [`ReduxMonitor`](crate::client::ReduxMonitor) is the live implementation;
//! [`MonitorMock`] satisfies the same contract with no transport, for tests and
//! builds that should not talk to an inspection tool.

use crate::serializable::AnySerializable;

use std::fmt::Display;

use log::Level;
use url::Url;

pub trait MonitorProvider: Send + Sync {
    /// Destination of the monitor, if it has one.
    fn url(&self) -> Option<&Url>;

    /// Start the client. Calling it again is a no-op.
    fn connect(&self);

    /// Fire-and-forget log sink.
    fn log(&self, message: &str, detail: &dyn Display, level: Level);

    /// Schedule one recorded action and its resulting state for transmission.
    fn add_task(&self, action: AnySerializable, state: AnySerializable);
}

/// No-op monitor.
#[derive(Debug, Clone, Default)]
pub struct MonitorMock {
    pub url: Option<Url>,
}

impl MonitorMock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MonitorProvider for MonitorMock {
    fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    fn connect(&self) {}

    fn log(&self, _message: &str, _detail: &dyn Display, _level: Level) {}

    fn add_task(&self, _action: AnySerializable, _state: AnySerializable) {}
}
