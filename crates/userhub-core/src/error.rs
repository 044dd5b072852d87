//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No live user exists with the given id.
    #[error("no user found with {0}")]
    UserNotFound(Uuid),

    /// A unique attribute is already held by another live user.
    #[error("a user with the same {field} already exists ({value})")]
    Duplicate {
        /// The unique attribute (`nickname` or `email`).
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on user {user_id}: expected version {expected}")]
    ConcurrencyConflict {
        /// The user that had the conflict.
        user_id: Uuid,
        /// The version the writer read before updating.
        expected: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the system.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Infrastructure(_))
    }
}
