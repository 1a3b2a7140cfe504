use common::ErrorLocation;

use std::borrow::Cow;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SerializationError {
    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Serializable Error: {type_name} {location}")]
    NotSerializable {
        type_name: Cow<'static, str>,
        location: ErrorLocation,
    },
}

impl From<serde_json::Error> for SerializationError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        SerializationError::Encode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
