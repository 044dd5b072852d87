//! Relay error types.

use thiserror::Error;

/// Failure to turn a wire message into an envelope, or a payload into JSON.
#[derive(Debug, Error)]
pub enum CodecError {
    /// `aggregate_type` carried a discriminant this build does not know.
    #[error("unknown aggregate type {0}")]
    UnknownAggregateType(i32),

    /// `event_name` carried a discriminant this build does not know.
    #[error("unknown event name {0}")]
    UnknownEventName(i32),

    /// An id field was not a UUID.
    #[error("malformed {field}: {value:?}")]
    MalformedId {
        /// The offending field.
        field: &'static str,
        /// The raw value.
        value: String,
    },

    /// A JSON payload could not be encoded or decoded.
    #[error("malformed payload: {0}")]
    Payload(String),
}

/// A transport-level failure of one relay exchange.
///
/// None of these say anything about whether the operation succeeded on the
/// worker; a failed operation arrives as a successful exchange whose reply
/// carries `status_code >= 400`.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The stream could not be opened.
    #[error("failed to open stream to worker: {0}")]
    Connect(String),

    /// The event could not be written to the stream.
    #[error("failed to send event: stream closed by worker")]
    Send,

    /// Reading from the stream failed.
    #[error("failed to receive from stream: {}", .0.message())]
    Receive(tonic::Status),

    /// The worker ended the stream without replying.
    #[error("worker closed the stream before replying")]
    ClosedBeforeReply,

    /// The gateway ended the stream without sending an event.
    #[error("gateway closed the stream before sending an event")]
    ClosedBeforeEvent,

    /// A session operation was used out of order.
    #[error("stream protocol violation: {0}")]
    Protocol(String),

    /// A message could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The reply answers a different event.
    #[error("reply correlation mismatch: expected {expected}, got {actual}")]
    CorrelationMismatch {
        /// The `aggregate_id` that was sent.
        expected: String,
        /// The `correlation_id` that came back.
        actual: String,
    },
}
