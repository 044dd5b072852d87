//! The seam between a transport and the handler that applies a mutation.

use std::fmt;

use uuid::Uuid;

/// A user-mutating intent, already decoded from its transport.
pub trait Command: Send + Sync + fmt::Debug {
    /// Stable dotted name, logged as the `command` field.
    fn command_type(&self) -> &'static str;

    /// The `aggregate_id` of the event that carried this command.
    fn correlation_id(&self) -> Uuid;

    /// The existing user the command acts on; `None` for a creation.
    fn target(&self) -> Option<Uuid> {
        None
    }
}
