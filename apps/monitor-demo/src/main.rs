use monitor_demo::error::DemoError;
use monitor_demo::logger::{LoggerSettings, initialize as LoggerInitialize};
use monitor_demo::store::{AppState, NAMES, OnNameChange, SetName, Store, StoreInit};

use monitor_core::error::MonitorError;
use monitor_core::{CommandParser, MonitorConfig, MonitorMiddleware, ReduxMonitor};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::time::sleep;

const DISPATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Time left for the queue worker after the last dispatch.
const FLUSH_GRACE: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    let log_dir = std::env::temp_dir().join("redux-monitor-demo");
    create_dir_all(&log_dir).map_err(|e| DemoError::Demo {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Logger first, so config loading is visible
    LoggerInitialize(&LoggerSettings::new(&log_dir))?;
    info!("Redux monitor demo starting");

    if let Err(e) = dotenvy::dotenv() {
        info!("No .env file loaded: {e}");
    }

    let config_dir = std::env::current_dir().map_err(|e| DemoError::Demo {
        message: format!("Failed to read current directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    let mut config = MonitorConfig::load(&config_dir).map_err(MonitorError::from)?;
    config.apply_env_overrides();
    info!("Monitor mode: {:?}", config.mode);

    let monitor = ReduxMonitor::new(config).map_err(MonitorError::from)?;

    let (remote_tx, remote_rx) = mpsc::unbounded_channel();
    let parser = CommandParser::<AppState, SetName>::new(remote_tx);
    monitor.set_command_handler(move |command| parser.handle(command));

    let middleware = MonitorMiddleware::new(Arc::new(monitor));
    let store = Store::spawn(AppState::default(), middleware, remote_rx);

    store.dispatch(StoreInit::default())?;
    store.dispatch(OnNameChange {
        callback: Box::new(|name| info!("Current name: {name}")),
    })?;

    for step in 1..NAMES.len() {
        sleep(DISPATCH_INTERVAL).await;

        let current = store.state().await.name;
        let next = next_name(&current, step);
        info!("Dispatching SetName({next})");
        if let Err(e) = store.dispatch(SetName::new(next)) {
            warn!("Store stopped early: {e}");
            break;
        }
    }

    store.flush().await?;
    sleep(FLUSH_GRACE).await;
    info!("Redux monitor demo finished");
    Ok(())
}

/// Pick the name at `step`, skipping over `current`.
fn next_name(current: &str, step: usize) -> &'static str {
    let candidate = NAMES[step % NAMES.len()];
    if candidate == current {
        NAMES[(step + 1) % NAMES.len()]
    } else {
        candidate
    }
}
