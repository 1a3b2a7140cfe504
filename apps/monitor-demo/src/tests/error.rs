// Unit tests for error module

use crate::error::DemoError;

use monitor_core::MonitorConfig;
use monitor_core::error::MonitorError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors serialize with their variant tag and data.
///
/// **BUG THIS CATCHES**: Would catch someone removing `#[derive(Serialize)]` or
/// changing the `type`/`data` tagging the error reports rely on.
#[test]
fn given_demo_error_when_serialized_then_tagged_with_variant() {
    // GIVEN: A StoreStopped error
    let err = DemoError::StoreStopped {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(&err).unwrap();

    // THEN: Tag and message are present
    assert_eq!(json["type"], "StoreStopped");
    assert_eq!(json["data"]["message"], "Test");
}

/// **VALUE**: Verifies that a missing monitor url surfaces as a Core error.
#[test]
fn given_config_without_url_when_converted_then_is_core_error() {
    // GIVEN: A config with no destination
    let config = MonitorConfig {
        url: None,
        ..MonitorConfig::default()
    };

    // WHEN: Building the target url and converting the error
    let err: DemoError = MonitorError::from(config.target_url().unwrap_err()).into();

    // THEN: Core variant carrying the core message
    match err {
        DemoError::Core { message, .. } => assert!(message.contains("Missing Url"), "{message}"),
        other => panic!("Expected Core, got {other:?}"),
    }
}
