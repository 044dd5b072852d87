//! Commands for the users context.

use userhub_core::command::Command;
use userhub_core::user::{NewUser, UserPatch};
use uuid::Uuid;

/// Command to register a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The creation document.
    pub new_user: NewUser,
}

impl Command for CreateUser {
    fn command_type(&self) -> &'static str {
        "users.create_user"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to patch an existing user.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user to patch.
    pub user_id: Uuid,
    /// Fields to replace.
    pub patch: UserPatch,
}

impl Command for UpdateUser {
    fn command_type(&self) -> &'static str {
        "users.update_user"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to soft-delete a user.
#[derive(Debug, Clone)]
pub struct DeleteUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user to delete.
    pub user_id: Uuid,
}

impl Command for DeleteUser {
    fn command_type(&self) -> &'static str {
        "users.delete_user"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}
