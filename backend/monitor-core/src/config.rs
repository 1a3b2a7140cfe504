use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "redux-monitor.json";
const CONFIG_VERSION: u32 = 1;

pub const DEFAULT_MONITOR_URL: &str = "ws://0.0.0.0:8000/socketcluster/?transport=websocket";
pub const DEFAULT_LOGIN_ROLE: &str = "master";

pub const URL_ENV_KEY: &str = "REDUX_MONITOR_URL";
pub const MODE_ENV_KEY: &str = "REDUX_MONITOR_MODE";

// ============================================
// ENUMS WITH DEFAULTS
// ============================================

/// Whether the monitor also accepts commands from the inspection tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MonitorMode {
    /// Stream actions out, ignore inbound commands.
    #[default]
    Unidirectional,

    /// Stream actions out, log in after the handshake, and accept commands.
    Bidirectional,
}

impl MonitorMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unidirectional" | "uni" => Some(MonitorMode::Unidirectional),
            "bidirectional" | "bi" => Some(MonitorMode::Bidirectional),
            _ => None,
        }
    }
}

// ============================================
// CONFIG STRUCT
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// WebSocket address of the inspection tool. `None` means no destination.
    #[serde(default = "default_url")]
    pub url: Option<String>,

    #[serde(default)]
    pub mode: MonitorMode,

    /// Value of the `login` frame in bidirectional mode.
    #[serde(default = "default_login_role")]
    pub login_role: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            url: default_url(),
            mode: MonitorMode::default(),
            login_role: default_login_role(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_url() -> Option<String> {
    Some(DEFAULT_MONITOR_URL.to_string())
}
fn default_login_role() -> String {
    DEFAULT_LOGIN_ROLE.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl MonitorConfig {
    /// Config pointing at `url` with every other field defaulted.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Load config from {config_dir}/redux-monitor.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable, corrupted or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Monitor config not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read monitor config: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: MonitorConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse monitor config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Monitor config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/redux-monitor.json using temp file + rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Monitor config saved to {}", config_path.display());
        Ok(())
    }

    /// Override fields from `REDUX_MONITOR_URL` and `REDUX_MONITOR_MODE`.
    ///
    /// Unset variables leave the field alone; an unknown mode is logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(URL_ENV_KEY) {
            info!("Monitor url overridden by {URL_ENV_KEY}");
            self.url = Some(url);
        }

        match env::var(MODE_ENV_KEY) {
            Ok(value) => match MonitorMode::parse(&value) {
                Some(mode) => {
                    info!("Monitor mode overridden by {MODE_ENV_KEY}: {mode:?}");
                    self.mode = mode;
                }
                None => warn!("Ignoring unknown {MODE_ENV_KEY} value: {value}"),
            },
            Err(env::VarError::NotUnicode(_)) => {
                warn!("Env var {MODE_ENV_KEY} contains invalid unicode");
            }
            Err(env::VarError::NotPresent) => {}
        }
    }

    /// Parse the configured destination.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingUrl`] if no url is configured
    /// - [`ConfigError::ValidationError`] if it does not parse or is not `ws`/`wss`
    pub fn target_url(&self) -> Result<Url, ConfigError> {
        let raw = self.url.as_deref().ok_or(ConfigError::MissingUrl {
            location: ErrorLocation::from(Location::caller()),
        })?;

        let url = Url::parse(raw).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid monitor url {raw}: {e}"),
        })?;

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            scheme => Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Unsupported monitor url scheme: {scheme} (expected ws or wss)"),
            }),
        }
    }

    /// Validate config values.
    ///
    /// A missing url is valid here (a mock monitor needs none); only a live
    /// monitor requires one, see [`target_url`](Self::target_url).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.login_role.is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "login_role cannot be empty".to_string(),
            });
        }

        if self.url.is_some() {
            self.target_url()?;
        }

        Ok(())
    }
}
