use crate::config::{
    DEFAULT_MONITOR_URL, MODE_ENV_KEY, MonitorConfig, MonitorMode, URL_ENV_KEY,
};
use crate::error::config::ConfigError;

use std::fs;

use serial_test::serial;
use tempfile::tempdir;

#[test]
fn given_no_config_file_when_loaded_then_returns_defaults() {
    let dir = tempdir().expect("tempdir");

    let config = MonitorConfig::load(dir.path()).expect("load");

    assert_eq!(config.url.as_deref(), Some(DEFAULT_MONITOR_URL));
    assert_eq!(config.mode, MonitorMode::Unidirectional);
    assert_eq!(config.login_role, "master");
}

#[test]
fn given_partial_config_file_when_loaded_then_fills_defaults() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("redux-monitor.json"),
        r#"{"url":"ws://127.0.0.1:9000/socketcluster/","mode":"Bidirectional"}"#,
    )
    .expect("write");

    let config = MonitorConfig::load(dir.path()).expect("load");

    assert_eq!(
        config.url.as_deref(),
        Some("ws://127.0.0.1:9000/socketcluster/")
    );
    assert_eq!(config.mode, MonitorMode::Bidirectional);
    assert_eq!(config.version, 1);
}

#[test]
fn given_corrupt_config_file_when_loaded_then_returns_parse_error() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("redux-monitor.json"), "{ nope").expect("write");

    let result = MonitorConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_http_url_when_validated_then_returns_validation_error() {
    let config = MonitorConfig::with_url("http://127.0.0.1:8000");

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

/// **VALUE**: Verifies that an explicitly absent destination is reported as such.
///
/// **WHY THIS MATTERS**: A live monitor without an address cannot do anything useful;
/// construction must fail loudly instead of producing a client that never connects.
#[test]
fn given_null_url_when_target_url_requested_then_returns_missing_url() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("redux-monitor.json"), r#"{"url":null}"#).expect("write");

    let config = MonitorConfig::load(dir.path()).expect("a missing url is still a valid config");

    assert!(config.url.is_none());
    assert!(matches!(
        config.target_url(),
        Err(ConfigError::MissingUrl { .. })
    ));
}

#[test]
fn given_config_when_saved_then_loads_back_equal() {
    let dir = tempdir().expect("tempdir");
    let mut config = MonitorConfig::with_url("wss://monitor.local/socketcluster/");
    config.mode = MonitorMode::Bidirectional;

    config.save(dir.path()).expect("save");
    let loaded = MonitorConfig::load(dir.path()).expect("load");

    assert_eq!(loaded.url, config.url);
    assert_eq!(loaded.mode, MonitorMode::Bidirectional);
    assert!(!dir.path().join("redux-monitor.json.tmp").exists());
}

#[test]
fn given_empty_login_role_when_validated_then_fails() {
    let mut config = MonitorConfig::default();
    config.login_role.clear();

    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn given_env_overrides_when_applied_then_replace_url_and_mode() {
    // SAFETY: serialized with the other env tests, no other thread reads these keys
    unsafe {
        std::env::set_var(URL_ENV_KEY, "ws://10.0.0.2:8000/socketcluster/");
        std::env::set_var(MODE_ENV_KEY, "bidirectional");
    }

    let mut config = MonitorConfig::default();
    config.apply_env_overrides();

    unsafe {
        std::env::remove_var(URL_ENV_KEY);
        std::env::remove_var(MODE_ENV_KEY);
    }

    assert_eq!(
        config.url.as_deref(),
        Some("ws://10.0.0.2:8000/socketcluster/")
    );
    assert_eq!(config.mode, MonitorMode::Bidirectional);
}

#[test]
#[serial]
fn given_unknown_mode_env_when_applied_then_mode_unchanged() {
    unsafe {
        std::env::set_var(MODE_ENV_KEY, "sideways");
    }

    let mut config = MonitorConfig::default();
    config.apply_env_overrides();

    unsafe {
        std::env::remove_var(MODE_ENV_KEY);
    }

    assert_eq!(config.mode, MonitorMode::Unidirectional);
}
