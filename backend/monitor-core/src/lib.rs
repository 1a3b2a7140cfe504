//! Debug-bridge client for Redux-style state pipelines.
//!
//! The monitor observes every applied action, wraps the action and the resulting
//! state in a `log` envelope and streams it over a WebSocket to a remote
//! inspection tool. In bidirectional mode it also decodes commands coming back
//! (replay an action, jump to a state) and hands them to the pipeline.
//!
//! # Layout
//!
//! - [`middleware`] - the seam the pipeline calls after each transition
//! - [`client`] - transport, handshake state machine, receive loop
//! - [`queue`] - gated single-worker queue preserving send order
//! - [`envelope`] - wire structs
//! - [`command`] - remote commands into pipeline commands
//! - [`provider`] - the contract plus a no-op mock

/// `log` target prefix of every line this crate emits outside the sink.
pub const LOG_MODULE: &str = module_path!();

pub mod client;
pub mod command;
pub mod config;
pub mod counter;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod provider;
pub mod queue;
pub mod serializable;

#[cfg(test)]
mod tests;

pub use client::ReduxMonitor;
pub use client::session::ConnectionPhase;
pub use command::{CommandHandler, CommandParser, PipelineCommand};
pub use config::{MonitorConfig, MonitorMode};
pub use middleware::MonitorMiddleware;
pub use provider::{MonitorMock, MonitorProvider};
pub use serializable::{AnySerializable, Monitored, Serializable};
