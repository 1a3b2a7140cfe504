use monitor_core::error::MonitorError;

use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the demo host.
///
/// The monitor itself never fails the host once built; these cover startup
/// (logger, config, monitor construction) and talking to the store actor.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DemoError {
    /// Error from this App
    #[error("Demo Error: {message} {location}")]
    Demo {
        message: String,
        location: ErrorLocation,
    },

    /// Error from monitor-core (config, monitor construction)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// The store actor is no longer running
    #[error("Store Error: {message} {location}")]
    StoreStopped {
        message: String,
        location: ErrorLocation,
    },
}

impl From<MonitorError> for DemoError {
    #[track_caller]
    fn from(error: MonitorError) -> Self {
        DemoError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
