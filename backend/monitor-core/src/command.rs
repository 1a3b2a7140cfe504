//! Remote monitor commands into pipeline commands.
//!
//! The connection task receives [`MonitorCommand`]s on the socket's context.
//! [`CommandParser`] decodes the embedded JSON into the pipeline's own state and
//! action types and forwards the result over a channel, so the pipeline applies
//! it on its own task and never on the socket's.

use crate::envelope::MonitorCommand;

use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

/// Callback the monitor invokes for each decoded remote command.
pub type CommandHandler = Arc<dyn Fn(MonitorCommand) + Send + Sync>;

/// What the pipeline is asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineCommand<S, A> {
    /// Replace the whole state.
    SetState(S),

    /// Run the action through the pipeline.
    Dispatch(A),
}

pub struct CommandParser<S, A> {
    pipeline: mpsc::UnboundedSender<PipelineCommand<S, A>>,
}

impl<S, A> CommandParser<S, A>
where
    S: DeserializeOwned + Send + 'static,
    A: DeserializeOwned + Send + 'static,
{
    /// `pipeline` is drained by the pipeline's own task.
    pub fn new(pipeline: mpsc::UnboundedSender<PipelineCommand<S, A>>) -> Self {
        Self { pipeline }
    }

    /// Decode a command. `None` means the embedded JSON did not match.
    pub fn parse(command: &MonitorCommand) -> Option<PipelineCommand<S, A>> {
        match command {
            MonitorCommand::JumpToState { state, .. } => match serde_json::from_str::<S>(state) {
                Ok(state) => Some(PipelineCommand::SetState(state)),
                Err(e) => {
                    debug!("Dropping jump-to-state command: {e}");
                    None
                }
            },
            MonitorCommand::Action { action } => match serde_json::from_str::<A>(action) {
                Ok(action) => Some(PipelineCommand::Dispatch(action)),
                Err(e) => {
                    warn!("Dropping remote action that does not decode: {e}");
                    None
                }
            },
        }
    }

    /// Decode and hand off to the pipeline.
    pub fn handle(&self, command: MonitorCommand) {
        if let Some(command) = Self::parse(&command)
            && self.pipeline.send(command).is_err()
        {
            warn!("Pipeline stopped listening, dropping remote command");
        }
    }

    /// Wrap the parser as the callback the monitor invokes.
    pub fn into_handler(self) -> CommandHandler {
        Arc::new(move |command| self.handle(command))
    }
}
