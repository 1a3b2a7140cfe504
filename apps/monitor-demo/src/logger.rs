//! Logging for the monitor demo host.
//!
//! Dual output (colored stdout + plain file), installed once per process.
//! `monitor_level` applies to everything the monitor emits: its sink lines under
//! the `redux_monitor` target and its internal lines under `monitor_core::*`.

use crate::error::DemoError;

use monitor_core::LOG_MODULE;
use monitor_core::client::LOG_TARGET;

use common::ErrorLocation;

use std::fmt::Arguments;
use std::io::stdout;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

/// Set by the first successful [`initialize`].
static LOGGER_INSTALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "redux-monitor-demo.log";

/// Overrides the host level, e.g. `REDUX_MONITOR_DEMO_LOG=trace`.
pub const LOG_LEVEL_ENV_KEY: &str = "REDUX_MONITOR_DEMO_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Socket internals stay at info even in debug builds.
const TRANSPORT_TARGETS: [&str; 2] = ["tungstenite", "tokio_tungstenite"];

#[derive(Debug, Clone)]
pub struct LoggerSettings {
    pub log_dir: PathBuf,
    pub level: LevelFilter,
    pub monitor_level: LevelFilter,
}

impl LoggerSettings {
    /// Build-profile defaults, with the host level taken from
    /// [`LOG_LEVEL_ENV_KEY`] when it parses.
    pub fn new(log_dir: &Path) -> Self {
        let level = std::env::var(LOG_LEVEL_ENV_KEY)
            .ok()
            .and_then(|value| LevelFilter::from_str(&value).ok())
            .unwrap_or(DEFAULT_LOG_LEVEL);

        Self {
            log_dir: log_dir.to_path_buf(),
            level,
            monitor_level: DEFAULT_LOG_LEVEL,
        }
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}

/// Install the global logger.
///
/// Later calls after a successful install log a warning and return `Ok`.
///
/// # Errors
///
/// Returns [`DemoError::Demo`] if the log file cannot be created or another
/// logger is already installed.
pub fn initialize(settings: &LoggerSettings) -> Result<(), DemoError> {
    if LOGGER_INSTALLED.load(Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    build_dispatch(settings)?
        .apply()
        .map_err(|e| DemoError::Demo {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    LOGGER_INSTALLED.store(true, Ordering::SeqCst);
    info!(
        "Logger initialized with level {:?} (monitor: {:?}) writing to {}",
        settings.level,
        settings.monitor_level,
        settings.log_file_path().display()
    );
    Ok(())
}

/// Assemble the stdout + file dispatch without installing it.
pub fn build_dispatch(settings: &LoggerSettings) -> Result<Dispatch, DemoError> {
    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let log_file = fern::log_file(settings.log_file_path()).map_err(|e| DemoError::Demo {
        message: format!(
            "Failed to create log file {}: {e}",
            settings.log_file_path().display()
        ),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let mut base = Dispatch::new()
        .level(settings.level)
        .level_for(LOG_TARGET, settings.monitor_level)
        .level_for(LOG_MODULE, settings.monitor_level);
    for target in TRANSPORT_TARGETS {
        base = base.level_for(target, settings.level.min(LevelFilter::Info));
    }

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            write_line(out, message, record, colors.color(record.level()))
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| write_line(out, message, record, record.level()))
        .chain(log_file);

    Ok(base.chain(stdout_dispatch).chain(file_dispatch))
}

fn write_line(
    out: FormatCallback<'_>,
    message: &Arguments<'_>,
    record: &Record<'_>,
    level: impl std::fmt::Display,
) {
    out.finish(format_args!(
        "[{date} - {level} - {target}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        target = record.target(),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
