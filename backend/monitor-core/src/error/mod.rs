pub mod config;
pub mod serialization;
pub mod transport;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Transport(#[from] transport::TransportError),

    #[error(transparent)]
    Serialization(#[from] serialization::SerializationError),
}
