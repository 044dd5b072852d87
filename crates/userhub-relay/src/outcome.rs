//! Mapping a relay result onto an HTTP-shaped outcome.

use serde::Serialize;
use serde_json::Value;
use userhub_core::event::{EventName, ReplyEnvelope};
use userhub_core::user::{User, UserView};

use crate::error::{CodecError, RelayError};

/// Body returned to the HTTP caller for a relayed command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    /// Mirrors the HTTP status.
    pub status_code: u16,
    /// Human-readable outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Resulting entity, or the worker's error payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// The resolved result of one relayed command.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// HTTP status to answer with.
    pub status: u16,
    /// Body to answer with.
    pub body: ResponseBody,
}

impl DispatchOutcome {
    fn new(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status,
            body: ResponseBody {
                status_code: status,
                message: Some(message.into()),
                data,
            },
        }
    }
}

const TRANSPORT_FAILURE_STATUS: u16 = 400;

fn failure_data(data: &[u8]) -> Option<Value> {
    if data.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(data)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(data).into_owned())),
    )
}

fn public_view(data: &[u8]) -> Result<Value, RelayError> {
    let user: User =
        serde_json::from_slice(data).map_err(|e| CodecError::Payload(e.to_string()))?;
    serde_json::to_value(UserView::from(user))
        .map_err(|e| RelayError::Codec(CodecError::Payload(e.to_string())))
}

fn map_success(event_name: EventName, reply: &ReplyEnvelope) -> Result<DispatchOutcome, RelayError> {
    Ok(match event_name {
        EventName::Created => DispatchOutcome::new(201, "User created!", Some(public_view(&reply.data)?)),
        EventName::Updated => DispatchOutcome::new(200, "User updated!", Some(public_view(&reply.data)?)),
        EventName::Deleted => DispatchOutcome::new(200, "User successfully deleted!", None),
    })
}

/// Resolves a relay result to exactly one outcome.
///
/// A transport failure becomes a 400 carrying the error text. A reply with
/// `status_code >= 400` passes through with its status, message and data. A
/// successful reply has its payload re-shaped into the public user view, so
/// a password hash can never reach the caller.
#[must_use]
pub fn map_reply(event_name: EventName, result: Result<ReplyEnvelope, RelayError>) -> DispatchOutcome {
    let reply = match result {
        Ok(reply) => reply,
        Err(err) => return DispatchOutcome::new(TRANSPORT_FAILURE_STATUS, err.to_string(), None),
    };

    if reply.is_failure() {
        let status = u16::try_from(reply.status_code)
            .ok()
            .filter(|s| (400..600).contains(s))
            .unwrap_or(500);
        return DispatchOutcome::new(status, reply.message, failure_data(&reply.data));
    }

    map_success(event_name, &reply)
        .unwrap_or_else(|err| DispatchOutcome::new(TRANSPORT_FAILURE_STATUS, err.to_string(), None))
}
