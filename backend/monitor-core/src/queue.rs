//! Single-worker, gated outbound queue.
//!
//! # Architecture
//!
//! - Items go into an unbounded mpsc channel; [`OutboundQueue::enqueue`] never waits
//! - One worker task drains the channel and awaits each send before taking the next,
//!   so at most one send is in flight and sends happen in enqueue order
//! - A `watch` channel carries the gate. The queue starts suspended; while it is
//!   suspended items stay buffered in the channel
//!
//! The worker is spawned lazily by [`OutboundQueue::start`], which lets the queue be
//! created outside a runtime and fill up before the first connection.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use log::{debug, warn};
use tokio::sync::{mpsc, watch};

/// Ordered, suspendable task queue with exactly one worker.
pub struct OutboundQueue<T> {
    tx: mpsc::UnboundedSender<T>,

    /// Taken by the worker on [`start`](Self::start).
    rx: Mutex<Option<mpsc::UnboundedReceiver<T>>>,

    /// `true` when the worker may release items.
    gate: watch::Sender<bool>,
}

impl<T: Send + 'static> OutboundQueue<T> {
    /// Create a suspended queue with no worker yet.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (gate, _) = watch::channel(false);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            gate,
        }
    }

    /// Schedule an item. Returns immediately.
    pub fn enqueue(&self, item: T) {
        if self.tx.send(item).is_err() {
            warn!("Outbound queue worker is gone, dropping item");
        }
    }

    /// Allow the worker to release buffered and future items.
    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    /// Hold items in the buffer until the next [`resume`](Self::resume).
    pub fn suspend(&self) {
        self.gate.send_replace(false);
    }

    pub fn is_suspended(&self) -> bool {
        !*self.gate.borrow()
    }

    /// Spawn the worker on the current tokio runtime.
    ///
    /// `send` is awaited for each released item before the next one is taken.
    /// Returns `false` if the worker was already started.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, like `tokio::spawn`.
    pub fn start<F, Fut>(&self, send: F) -> bool
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner).take();
        match rx {
            Some(rx) => {
                tokio::spawn(run_worker(rx, self.gate.subscribe(), send));
                debug!("Outbound queue worker spawned");
                true
            }
            None => false,
        }
    }
}

impl<T: Send + 'static> Default for OutboundQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker loop: wait for the gate, take one item, send it, repeat.
///
/// An item received while the gate was open but found suspended afterwards is
/// held back and released first once the gate reopens, so ordering survives
/// a suspend racing with a receive.
async fn run_worker<T, F, Fut>(
    mut rx: mpsc::UnboundedReceiver<T>,
    mut gate: watch::Receiver<bool>,
    mut send: F,
) where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut held: Option<T> = None;

    loop {
        if gate.wait_for(|open| *open).await.is_err() {
            break;
        }

        let item = match held.take() {
            Some(item) => item,
            None => tokio::select! {
                item = rx.recv() => match item {
                    Some(item) => item,
                    None => break,
                },
                changed = gate.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            },
        };

        if !*gate.borrow() {
            held = Some(item);
            continue;
        }

        send(item).await;
    }

    debug!("Outbound queue worker stopped");
}
