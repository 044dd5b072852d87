//! Relay envelopes: the command `EventEnvelope` a gateway sends and the
//! `ReplyEnvelope` a worker answers with.
//!
//! These are the transport-neutral shapes; the protobuf mapping lives in the
//! relay crate.

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::DomainError;

/// The aggregate an event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateType {
    /// The User aggregate.
    User,
}

/// The mutating intent carried by an event.
///
/// The name decides how `event_data` is read: a full creation document on
/// `Created`, a partial-update document on `Updated`, nothing on `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventName {
    /// Create a user.
    Created,
    /// Patch an existing user.
    Updated,
    /// Soft-delete an existing user.
    Deleted,
}

impl EventName {
    /// Stable lowercase label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// A command envelope carrying one mutating intent from gateway to worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Fresh per dispatch; echoed back by the worker for correlation.
    pub aggregate_id: Uuid,
    /// Targeted aggregate.
    pub aggregate_type: AggregateType,
    /// Intent.
    pub event_name: EventName,
    /// Raw JSON payload.
    pub event_data: Vec<u8>,
    /// Seconds since the Unix epoch at dispatch time.
    pub event_date: i64,
    /// Target user id; `None` on create.
    pub internal_id: Option<Uuid>,
}

impl EventEnvelope {
    /// Decodes `event_data` as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the payload is not valid JSON for `T`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_slice(&self.event_data).map_err(|e| {
            DomainError::Validation(format!(
                "malformed {} payload: {e}",
                self.event_name.as_str()
            ))
        })
    }

    /// The target user id, required for updates and deletes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the envelope carries no id.
    pub fn target(&self) -> Result<Uuid, DomainError> {
        self.internal_id.ok_or_else(|| {
            DomainError::Validation(format!(
                "{} event requires an internal_id",
                self.event_name.as_str()
            ))
        })
    }
}

/// Status code of a successful create.
pub const STATUS_CREATED: i32 = 201;
/// Status code of a successful update or delete.
pub const STATUS_OK: i32 = 200;
/// Status code of a domain-level failure.
pub const STATUS_BAD_REQUEST: i32 = 400;
/// Status code of a worker-side infrastructure failure.
pub const STATUS_INTERNAL: i32 = 500;

/// The single reply to an event.
///
/// `status_code >= 400` is a failed operation delivered over a successful
/// exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyEnvelope {
    /// HTTP-style status.
    pub status_code: i32,
    /// Human-readable outcome.
    pub message: String,
    /// Optional JSON payload.
    pub data: Vec<u8>,
    /// The `aggregate_id` of the event this reply answers.
    pub correlation_id: String,
}

impl ReplyEnvelope {
    /// A successful reply.
    #[must_use]
    pub fn success(status_code: i32, message: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            status_code,
            message: message.into(),
            data,
            correlation_id: String::new(),
        }
    }

    /// A failed reply without payload.
    #[must_use]
    pub fn failure(status_code: i32, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            data: Vec::new(),
            correlation_id: String::new(),
        }
    }

    /// Maps a domain error onto a failed reply: client errors become 400,
    /// infrastructure errors 500.
    #[must_use]
    pub fn from_error(err: &DomainError) -> Self {
        let status = if err.is_client_error() {
            STATUS_BAD_REQUEST
        } else {
            STATUS_INTERNAL
        };
        Self::failure(status, err.to_string())
    }

    /// Stamps the reply with the id of the event it answers.
    #[must_use]
    pub fn correlated_with(mut self, aggregate_id: impl Into<String>) -> Self {
        self.correlation_id = aggregate_id.into();
        self
    }

    /// Whether the operation failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status_code >= STATUS_BAD_REQUEST
    }
}
