//! Recording dispatcher: a `CommandDispatcher` that never touches the network.

use std::sync::Mutex;

use async_trait::async_trait;
use userhub_core::event::ReplyEnvelope;
use userhub_relay::dispatcher::{CommandDispatcher, DispatchCommand};
use userhub_relay::error::RelayError;

#[derive(Debug, Clone)]
enum Scripted {
    Reply(ReplyEnvelope),
    Unreachable(String),
}

/// A dispatcher that records every command and answers each one with the
/// same scripted result.
#[derive(Debug)]
pub struct RecordingDispatcher {
    scripted: Scripted,
    dispatched: Mutex<Vec<DispatchCommand>>,
}

impl RecordingDispatcher {
    /// Answers every command with `reply`.
    #[must_use]
    pub fn replying(reply: ReplyEnvelope) -> Self {
        Self {
            scripted: Scripted::Reply(reply),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    /// Fails every command as if the worker could not be reached.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            scripted: Scripted::Unreachable(reason.into()),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all commands that were dispatched.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn dispatched(&self) -> Vec<DispatchCommand> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandDispatcher for RecordingDispatcher {
    async fn dispatch(&self, command: DispatchCommand) -> Result<ReplyEnvelope, RelayError> {
        self.dispatched.lock().unwrap().push(command);
        match &self.scripted {
            Scripted::Reply(reply) => Ok(reply.clone()),
            Scripted::Unreachable(reason) => Err(RelayError::Connect(reason.clone())),
        }
    }
}
