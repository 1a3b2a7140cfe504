//! Writer half of the WebSocket.
//!
//! The sink is owned by one writer task; everything else talks to it through a
//! channel, so control frames from the receive loop and log frames from the
//! queue worker are written in the order they were submitted. Dropping the last
//! [`TransportSender`] flushes pending frames and closes the socket.

use crate::error::transport::TransportError;

use common::ErrorLocation;

use std::panic::Location;

use futures_util::{Sink, SinkExt};
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

struct WriteRequest {
    message: Message,
    ack: Option<oneshot::Sender<Result<(), TransportError>>>,
}

#[derive(Clone)]
pub(crate) struct TransportSender {
    tx: mpsc::UnboundedSender<WriteRequest>,
}

impl TransportSender {
    /// Spawn the writer task that owns `sink`.
    pub(crate) fn spawn<S>(sink: S) -> Self
    where
        S: Sink<Message, Error = WsError> + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_loop(sink, rx));
        Self { tx }
    }

    /// Submit a text frame without waiting for the write.
    #[track_caller]
    pub(crate) fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.submit(text, None)
    }

    /// Submit a text frame and wait until the sink accepted or rejected it.
    pub(crate) async fn send_text_and_wait(&self, text: String) -> Result<(), TransportError> {
        let location = ErrorLocation::from(Location::caller());
        let (ack_tx, ack_rx) = oneshot::channel();
        self.submit(text, Some(ack_tx))?;

        ack_rx.await.map_err(|_| TransportError::Closed {
            message: "Writer stopped before acknowledging the frame".to_string(),
            location,
        })?
    }

    #[track_caller]
    fn submit(
        &self,
        text: String,
        ack: Option<oneshot::Sender<Result<(), TransportError>>>,
    ) -> Result<(), TransportError> {
        let request = WriteRequest {
            message: Message::Text(text.into()),
            ack,
        };

        self.tx.send(request).map_err(|_| TransportError::Closed {
            message: "Writer task is not running".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

async fn writer_loop<S>(mut sink: S, mut rx: mpsc::UnboundedReceiver<WriteRequest>)
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    while let Some(request) = rx.recv().await {
        let result = sink.send(request.message).await.map_err(TransportError::from);

        match request.ack {
            Some(ack) => {
                let _ = ack.send(result);
            }
            None => {
                if let Err(e) = result {
                    error!("Could not send frame: {e}");
                }
            }
        }
    }

    if let Err(e) = sink.close().await {
        debug!("Closing socket failed: {e}");
    }
    debug!("Transport writer stopped");
}
