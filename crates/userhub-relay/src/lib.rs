//! UserHub event relay.
//!
//! A gateway turns each mutating HTTP request into one `Event`, opens a fresh
//! bidirectional stream to the worker, sends the event, reads exactly one
//! `Response`, and maps it back onto an HTTP-shaped outcome. This crate holds
//! everything both sides of that exchange share: the protobuf contract, the
//! envelope codec, and the stream session lifecycle, plus the gateway-side
//! dispatcher.

pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod session;

/// Generated protobuf types for the `EventRelay` service.
#[allow(clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("userhub.event.v1");
}

pub use proto::event_relay_client::EventRelayClient;
pub use proto::event_relay_server::{EventRelay, EventRelayServer};
