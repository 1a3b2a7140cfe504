//! Shared primitives for the redux-monitor workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): error location tracking shared by every error enum
//! - **monitor-core**: the monitor client (protocol, queue, middleware)
//! - **monitor-demo**: a host application wiring a store to the monitor
//!
//! Keeping location capture here lets both the library and the app report
//! `[file:line:column]` in their error messages without depending on each other.

pub mod error;

pub use error::error_location::ErrorLocation;
