//! Live monitor client.
//!
//! [`ReduxMonitor`] owns the correlation counter, the outbound queue and the
//! session state machine for one inspection session. [`ReduxMonitor::connect`]
//! spawns two long-lived tasks on the current tokio runtime:
//!
//! - the queue worker, which turns recorded events into `log` frames one at a time
//! - the connection task, which opens the socket, sends the handshake and then
//!   runs the receive loop (receive, handle, receive again) until the socket closes
//!
//! Writes from both go through a single writer task (see [`transport`]).
//!
//! # Protocol
//!
//! | Direction | Frame | When |
//! |---|---|---|
//! | out | `{"event":"#handshake","data":{},"cid":n}` | transport open |
//! | in / out | `"#1"` / `"#2"` | keepalive |
//! | in | `{"rid":n,"data":{"id":..,"isAuthenticated":..,"pingTimeout":..}}` | session identity |
//! | out | `{"event":"login","data":"master"}` | bidirectional, after identity |
//! | out | `{"event":"log","cid":n,"data":{..}}` | per recorded action |
//! | in | `{"event":..,"data":{"type":"DISPATCH"\|"ACTION",..}}` | bidirectional commands |
//!
//! There is no reconnect: once the socket closes the monitor stays `Closed`.

pub mod frame;
pub mod session;
mod transport;

use crate::client::session::{ConnectionPhase, Effect, SessionMachine};
use crate::client::transport::TransportSender;
use crate::command::CommandHandler;
use crate::config::MonitorConfig;
use crate::counter::AtomicCounter;
use crate::envelope::{ActionObject, EmitObject, MonitorCommand, MonitorEvent};
use crate::error::config::ConfigError;
use crate::error::serialization::SerializationError;
use crate::error::transport::TransportError;
use crate::provider::MonitorProvider;
use crate::queue::OutboundQueue;
use crate::serializable::AnySerializable;

use common::ErrorLocation;

use std::fmt::Display;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock as StdRwLock, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::StreamExt;
use log::{Level, debug, log};
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// `log` target for everything the monitor reports through its sink.
pub const LOG_TARGET: &str = "redux_monitor";

const LOG_PREFIX: &str = "[monitor] ";

/// Session id placed in events sent while no identity is known.
const UNIDENTIFIED_SESSION: &str = "unidentified";

/// One recorded transition waiting in the outbound queue.
#[derive(Debug)]
pub(crate) struct RecordedEvent {
    action: AnySerializable,
    state: AnySerializable,
    time_stamp: f64,
}

/// Live client for a remote inspection tool.
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct ReduxMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    url: Url,
    counter: AtomicCounter,
    queue: OutboundQueue<RecordedEvent>,
    session: RwLock<SessionMachine>,
    transport: RwLock<Option<TransportSender>>,
    command_handler: StdRwLock<Option<CommandHandler>>,
    started: AtomicBool,
}

impl ReduxMonitor {
    /// Build a monitor for `config`. Nothing is opened until [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingUrl`] if the config has no destination
    /// - [`ConfigError::ValidationError`] if the config is invalid
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        let url = config.target_url()?;
        config.validate()?;

        Ok(Self {
            inner: Arc::new(MonitorInner {
                url,
                counter: AtomicCounter::new(0),
                queue: OutboundQueue::new(),
                session: RwLock::new(SessionMachine::new(config.mode, config.login_role)),
                transport: RwLock::new(None),
                command_handler: StdRwLock::new(None),
                started: AtomicBool::new(false),
            }),
        })
    }

    /// Register the callback that receives remote commands (bidirectional mode).
    ///
    /// The callback runs on the connection task; hand work to the pipeline's own
    /// context from there, as [`CommandParser`](crate::command::CommandParser) does.
    pub fn set_command_handler<F>(&self, handler: F)
    where
        F: Fn(MonitorCommand) + Send + Sync + 'static,
    {
        let mut slot = self
            .inner
            .command_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(handler));
    }

    pub async fn phase(&self) -> ConnectionPhase {
        self.inner.session.read().await.phase()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.inner.session.read().await.session_id().map(str::to_owned)
    }

    pub fn is_queue_suspended(&self) -> bool {
        self.inner.queue.is_suspended()
    }
}

impl MonitorProvider for ReduxMonitor {
    fn url(&self) -> Option<&Url> {
        Some(&self.inner.url)
    }

    /// Spawn the queue worker and the connection task.
    ///
    /// Must be called from within a tokio runtime; otherwise the failure is
    /// logged and a later call may try again.
    fn connect(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!("Monitor already started");
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                self.inner.started.store(false, Ordering::SeqCst);
                self.log("Cannot connect outside a tokio runtime", &e, Level::Error);
                return;
            }
        };
        let _runtime = handle.enter();

        let weak: Weak<MonitorInner> = Arc::downgrade(&self.inner);
        self.inner.queue.start(move |event| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.send_event(event).await;
                }
            }
        });

        handle.spawn(run_connection(Arc::clone(&self.inner)));
    }

    fn log(&self, message: &str, detail: &dyn Display, level: Level) {
        self.inner.log(message, detail, level);
    }

    fn add_task(&self, action: AnySerializable, state: AnySerializable) {
        self.inner.queue.enqueue(RecordedEvent {
            action,
            state,
            time_stamp: now_seconds(),
        });
    }
}

impl MonitorInner {
    fn log(&self, message: &str, detail: &dyn Display, level: Level) {
        log!(target: LOG_TARGET, level, "{LOG_PREFIX}{message} {detail}");
    }

    /// Perform the effects of one transition, in order.
    async fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(frame) => match frame.encode() {
                    Ok(text) => self.send_control(text).await,
                    Err(e) => self.log("Failed to encode control frame", &e, Level::Error),
                },
                Effect::ResumeQueue => self.queue.resume(),
                Effect::SuspendQueue => self.queue.suspend(),
                Effect::Command(command) => self.dispatch_command(command),
            }
        }
    }

    async fn send_control(&self, text: String) {
        let transport = self.transport.read().await;
        match transport.as_ref() {
            Some(transport) => {
                if let Err(e) = transport.send_text(text) {
                    self.log("Could not send control frame", &e, Level::Error);
                }
            }
            None => debug!("No transport for control frame {text}"),
        }
    }

    fn dispatch_command(&self, command: MonitorCommand) {
        let handler = self
            .command_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler(command),
            None => debug!("No command handler registered, dropping {command:?}"),
        }
    }

    /// Queue worker body: envelope one event and wait for the write.
    async fn send_event(&self, event: RecordedEvent) {
        let session_id = self
            .session
            .read()
            .await
            .session_id()
            .unwrap_or(UNIDENTIFIED_SESSION)
            .to_string();

        let cid = self.counter.increment_and_get();
        let emit = EmitObject::new(
            cid,
            MonitorEvent::new(
                ActionObject::new(event.action, event.time_stamp),
                event.state,
                session_id,
            ),
        );

        let text = match serde_json::to_string(&emit).map_err(SerializationError::from) {
            Ok(text) => text,
            Err(e) => {
                self.log("Failed to send with error", &e, Level::Error);
                return;
            }
        };

        let transport = self.transport.read().await.clone();
        let result = match transport {
            Some(transport) => transport.send_text_and_wait(text).await,
            None => Err(TransportError::Closed {
                message: "No open transport".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        };

        if let Err(e) = result {
            self.log("Could not send string with error", &e, Level::Error);
        }
    }

    /// Drop the writer and discard session state.
    async fn teardown(&self) {
        self.transport.write().await.take();
        let effects = self.session.write().await.on_close();
        self.apply(effects).await;
    }
}

/// Connection task: open, handshake, then receive until the socket closes.
async fn run_connection(inner: Arc<MonitorInner>) {
    inner.session.write().await.begin_connect();

    let stream = match connect_async(inner.url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let error = TransportError::Connect {
                message: format!("Failed to connect to {}: {e}", inner.url),
                location: ErrorLocation::from(Location::caller()),
            };
            inner.log("Redux monitor could not connect", &error, Level::Error);
            inner.teardown().await;
            return;
        }
    };

    let (write, mut read) = stream.split();
    *inner.transport.write().await = Some(TransportSender::spawn(write));
    inner.log("Redux monitor did connect", &inner.url, Level::Info);

    let cid = inner.counter.increment_and_get();
    let effects = inner.session.write().await.on_open(cid);
    inner.apply(effects).await;

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let effects = inner.session.write().await.on_text(text.as_str());
                inner.apply(effects).await;
            }
            Ok(Message::Binary(data)) => {
                debug!("Ignoring binary frame of {} bytes", data.len());
            }
            Ok(Message::Close(frame)) => {
                debug!("Inspection tool closed the socket: {frame:?}");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                let error = TransportError::Read {
                    message: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                };
                inner.log("receive message with error", &error, Level::Error);
                break;
            }
        }
    }

    inner.teardown().await;
    inner.log("Redux monitor did disconnect", &inner.url, Level::Info);
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
