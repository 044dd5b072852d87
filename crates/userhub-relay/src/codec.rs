//! Envelope codec: protobuf messages to and from the core envelope types.

use serde::Serialize;
use userhub_core::event::{AggregateType, EventEnvelope, EventName, ReplyEnvelope};
use uuid::Uuid;

use crate::error::CodecError;
use crate::proto;

fn parse_id(field: &'static str, value: &str) -> Result<Uuid, CodecError> {
    Uuid::parse_str(value).map_err(|_| CodecError::MalformedId {
        field,
        value: value.to_owned(),
    })
}

fn aggregate_type_to_wire(value: AggregateType) -> proto::AggregateType {
    match value {
        AggregateType::User => proto::AggregateType::User,
    }
}

fn event_name_to_wire(value: EventName) -> proto::EventName {
    match value {
        EventName::Created => proto::EventName::Created,
        EventName::Updated => proto::EventName::Updated,
        EventName::Deleted => proto::EventName::Deleted,
    }
}

/// Encodes an envelope as a wire `Event`. An absent `internal_id` becomes the
/// empty string.
#[must_use]
pub fn encode_event(envelope: &EventEnvelope) -> proto::Event {
    proto::Event {
        aggregate_id: envelope.aggregate_id.to_string(),
        aggregate_type: aggregate_type_to_wire(envelope.aggregate_type).into(),
        event_name: event_name_to_wire(envelope.event_name).into(),
        event_data: envelope.event_data.clone(),
        event_date: envelope.event_date,
        internal_id: envelope
            .internal_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
    }
}

/// Decodes a wire `Event`.
///
/// # Errors
///
/// Returns `CodecError` for unknown enum values or ids that are not UUIDs.
pub fn decode_event(event: proto::Event) -> Result<EventEnvelope, CodecError> {
    let aggregate_type = match proto::AggregateType::try_from(event.aggregate_type) {
        Ok(proto::AggregateType::User) => AggregateType::User,
        Err(_) => return Err(CodecError::UnknownAggregateType(event.aggregate_type)),
    };
    let event_name = match proto::EventName::try_from(event.event_name) {
        Ok(proto::EventName::Created) => EventName::Created,
        Ok(proto::EventName::Updated) => EventName::Updated,
        Ok(proto::EventName::Deleted) => EventName::Deleted,
        Err(_) => return Err(CodecError::UnknownEventName(event.event_name)),
    };
    let internal_id = if event.internal_id.is_empty() {
        None
    } else {
        Some(parse_id("internal_id", &event.internal_id)?)
    };

    Ok(EventEnvelope {
        aggregate_id: parse_id("aggregate_id", &event.aggregate_id)?,
        aggregate_type,
        event_name,
        event_data: event.event_data,
        event_date: event.event_date,
        internal_id,
    })
}

/// Encodes a reply as a wire `Response`.
#[must_use]
pub fn encode_reply(reply: ReplyEnvelope) -> proto::Response {
    proto::Response {
        status_code: reply.status_code,
        message: reply.message,
        data: reply.data,
        correlation_id: reply.correlation_id,
    }
}

/// Decodes a wire `Response`.
#[must_use]
pub fn decode_reply(response: proto::Response) -> ReplyEnvelope {
    ReplyEnvelope {
        status_code: response.status_code,
        message: response.message,
        data: response.data,
        correlation_id: response.correlation_id,
    }
}

/// Serializes a payload document as JSON bytes.
///
/// # Errors
///
/// Returns `CodecError::Payload` if serialization fails.
pub fn encode_payload<T: Serialize>(payload: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(payload).map_err(|e| CodecError::Payload(e.to_string()))
}
