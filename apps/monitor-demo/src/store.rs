//! Demo state container using the actor pattern.
//!
//! The store owns `AppState` on a dedicated task. Local dispatches and remote
//! monitor commands both arrive over channels and are applied on that task, one
//! at a time, so the middleware always observes transitions in the order they
//! were applied.
//!
//! Reads go through `Arc<RwLock<AppState>>` and never wait on the actor.

use crate::error::DemoError;

use monitor_core::{AnySerializable, MonitorMiddleware, Monitored, PipelineCommand};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc, oneshot};

/// Names the demo cycles through.
pub const NAMES: [&str; 11] = [
    "Andy", "Hanna", "Moa", "Peter", "Ruby", "Tom", "Marcus", "Simon", "Jenny", "Mary", "Zlatan",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub name: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            name: NAMES[0].to_string(),
        }
    }
}

impl Monitored for AppState {
    fn snapshot(&self) -> Option<AnySerializable> {
        Some(AnySerializable::new(self.clone()))
    }
}

/// Anything the store can apply.
pub trait Action: Monitored + 'static {
    fn reduce(&self, state: &mut AppState);
}

/// Dispatched once when the store starts.
#[derive(Debug, Clone, Serialize)]
pub struct StoreInit {
    name: &'static str,
}

impl Default for StoreInit {
    fn default() -> Self {
        Self { name: "StoreInit" }
    }
}

impl Monitored for StoreInit {
    fn snapshot(&self) -> Option<AnySerializable> {
        Some(AnySerializable::new(self.clone()))
    }
}

impl Action for StoreInit {
    fn reduce(&self, _state: &mut AppState) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetName {
    pub payload: String,
}

impl SetName {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl Monitored for SetName {
    fn snapshot(&self) -> Option<AnySerializable> {
        Some(AnySerializable::new(self.clone()))
    }
}

impl Action for SetName {
    fn reduce(&self, state: &mut AppState) {
        state.name = self.payload.clone();
    }
}

/// Registers a callback for name changes. Carries a closure, so it is never monitored.
pub struct OnNameChange {
    pub callback: Box<dyn Fn(&str) + Send + Sync>,
}

impl Monitored for OnNameChange {
    fn snapshot(&self) -> Option<AnySerializable> {
        None
    }
}

impl Action for OnNameChange {
    fn reduce(&self, state: &mut AppState) {
        (self.callback)(&state.name);
    }
}

/// Commands processed by the store actor.
pub enum StoreCommand {
    Dispatch(Box<dyn Action>),

    /// Reply once every earlier command has been applied.
    Flush(oneshot::Sender<()>),
}

/// Remote commands decoded by the monitor.
pub type RemoteCommand = PipelineCommand<AppState, SetName>;

/// Handle to the store actor. Clones share the same state.
#[derive(Clone)]
pub struct Store {
    command_tx: mpsc::UnboundedSender<StoreCommand>,
    state: Arc<RwLock<AppState>>,
}

impl Store {
    /// Spawn the store actor on the current runtime.
    ///
    /// `remote_rx` carries commands from the inspection tool; they are applied
    /// on the store's task like local dispatches.
    pub fn spawn(
        initial: AppState,
        middleware: MonitorMiddleware,
        remote_rx: mpsc::UnboundedReceiver<RemoteCommand>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(initial));

        tokio::spawn(store_actor(
            command_rx,
            remote_rx,
            Arc::clone(&state),
            middleware,
        ));
        info!("Store actor spawned");

        Self { command_tx, state }
    }

    /// Queue an action. Returns once it is queued, not applied.
    #[track_caller]
    pub fn dispatch(&self, action: impl Action) -> Result<(), DemoError> {
        self.send(StoreCommand::Dispatch(Box::new(action)))
    }

    /// Wait until every previously dispatched action has been applied.
    pub async fn flush(&self) -> Result<(), DemoError> {
        let (tx, rx) = oneshot::channel();
        self.send(StoreCommand::Flush(tx))?;
        rx.await.map_err(|e| DemoError::StoreStopped {
            message: format!("Store actor dropped flush: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub async fn state(&self) -> AppState {
        self.state.read().await.clone()
    }

    #[track_caller]
    fn send(&self, command: StoreCommand) -> Result<(), DemoError> {
        self.command_tx
            .send(command)
            .map_err(|_| DemoError::StoreStopped {
                message: "Store actor is not running".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// The store actor task.
///
/// Reduces, publishes the new state, then lets the middleware observe.
async fn store_actor(
    mut command_rx: mpsc::UnboundedReceiver<StoreCommand>,
    mut remote_rx: mpsc::UnboundedReceiver<RemoteCommand>,
    state: Arc<RwLock<AppState>>,
    middleware: MonitorMiddleware,
) {
    info!("Store actor started");
    let mut remote_open = true;

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(StoreCommand::Dispatch(action)) => {
                    apply(action.as_ref(), &state, &middleware).await;
                }
                Some(StoreCommand::Flush(reply)) => {
                    let _ = reply.send(());
                }
                None => break,
            },
            remote = remote_rx.recv(), if remote_open => match remote {
                Some(PipelineCommand::Dispatch(action)) => {
                    debug!("Replaying remote action {:?}", action);
                    apply(&action, &state, &middleware).await;
                }
                Some(PipelineCommand::SetState(new_state)) => {
                    info!("Jumping to remote state: {:?}", new_state);
                    *state.write().await = new_state;
                }
                None => {
                    warn!("Remote command channel closed");
                    remote_open = false;
                }
            },
        }
    }

    info!("Store actor stopped");
}

async fn apply(action: &dyn Action, state: &RwLock<AppState>, middleware: &MonitorMiddleware) {
    let snapshot = {
        let mut state = state.write().await;
        action.reduce(&mut state);
        state.clone()
    };
    middleware.observe(action, &snapshot);
}
