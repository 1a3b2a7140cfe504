//! The seam the state pipeline calls through.
//!
//! The pipeline applies an action first, then hands the action and the
//! resulting state to [`MonitorMiddleware::observe`]. Observing never alters the
//! transition and never reports failure back: a value that cannot be serialized
//! costs one warning line and nothing else.

use crate::error::serialization::SerializationError;
use crate::provider::MonitorProvider;
use crate::serializable::Monitored;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::Level;

const NOT_SERIALIZABLE_MESSAGE: &str =
    "Could not monitor action because either state or action is not serializable";

#[derive(Clone)]
pub struct MonitorMiddleware {
    monitor: Arc<dyn MonitorProvider>,
}

impl MonitorMiddleware {
    /// Install the middleware. Connects the monitor.
    pub fn new(monitor: Arc<dyn MonitorProvider>) -> Self {
        monitor.connect();
        Self { monitor }
    }

    pub fn monitor(&self) -> &Arc<dyn MonitorProvider> {
        &self.monitor
    }

    /// Record one applied transition.
    ///
    /// The warning for an unserializable value carries the caller's location.
    #[track_caller]
    pub fn observe(&self, action: &dyn Monitored, state: &dyn Monitored) {
        match (action.snapshot(), state.snapshot()) {
            (Some(action), Some(state)) => self.monitor.add_task(action, state),
            _ => {
                let error = SerializationError::NotSerializable {
                    type_name: action.type_name(),
                    location: ErrorLocation::from(Location::caller()),
                };
                self.monitor.log(NOT_SERIALIZABLE_MESSAGE, &error, Level::Warn);
            }
        }
    }
}
