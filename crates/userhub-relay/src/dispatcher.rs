//! Gateway command dispatcher.
//!
//! Every call opens its own stream session; nothing is reused or multiplexed
//! across requests, and nothing is retried. A retried HTTP request therefore
//! becomes a fresh event with a fresh `aggregate_id`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tracing::{Instrument, info, info_span, warn};
use userhub_core::clock::Clock;
use userhub_core::event::{AggregateType, EventEnvelope, EventName, ReplyEnvelope};
use uuid::Uuid;

use crate::EventRelayClient;
use crate::codec;
use crate::error::RelayError;
use crate::outcome::{DispatchOutcome, map_reply};
use crate::session::StreamSession;

/// One mutating intent to relay to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCommand {
    /// What to do.
    pub event_name: EventName,
    /// Target user; `None` on create.
    pub internal_id: Option<Uuid>,
    /// Raw JSON request payload.
    pub payload: Vec<u8>,
}

/// Relays a command and returns the worker's reply.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    /// Sends `command` as one event and waits for its one reply.
    async fn dispatch(&self, command: DispatchCommand) -> Result<ReplyEnvelope, RelayError>;
}

/// Relays `command` and resolves the result to exactly one outcome.
pub async fn dispatch_command(
    dispatcher: &dyn CommandDispatcher,
    command: DispatchCommand,
) -> DispatchOutcome {
    let event_name = command.event_name;
    let result = dispatcher.dispatch(command).await;
    if let Err(err) = &result {
        warn!(event_name = event_name.as_str(), error = %err, "relay exchange failed");
    }
    map_reply(event_name, result)
}

/// Where and how to reach the worker.
#[derive(Debug, Clone)]
pub struct RelayClientConfig {
    /// Worker URI, e.g. `http://127.0.0.1:50051`.
    pub endpoint: String,
    /// Bound on establishing the TCP/HTTP2 connection.
    pub connect_timeout: Duration,
}

/// Dispatcher backed by the `EventRelay` gRPC service.
#[derive(Clone)]
pub struct GrpcCommandDispatcher {
    client: EventRelayClient<Channel>,
    clock: Arc<dyn Clock>,
}

impl GrpcCommandDispatcher {
    /// Builds a dispatcher whose channel connects on first use, so the
    /// gateway can start before the worker.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Connect` if the endpoint URI is invalid.
    pub fn connect_lazy(config: &RelayClientConfig, clock: Arc<dyn Clock>) -> Result<Self, RelayError> {
        let channel = Endpoint::from_shared(config.endpoint.clone())
            .map_err(|e| RelayError::Connect(format!("invalid worker endpoint: {e}")))?
            .connect_timeout(config.connect_timeout)
            .connect_lazy();

        Ok(Self {
            client: EventRelayClient::new(channel),
            clock,
        })
    }

    async fn exchange(&self, envelope: &EventEnvelope) -> Result<ReplyEnvelope, RelayError> {
        let mut client = self.client.clone();
        let mut session = StreamSession::open(&mut client).await?;
        session.send(codec::encode_event(envelope)).await?;
        let response = session.receive().await?;
        session.close();

        let reply = codec::decode_reply(response);
        let expected = envelope.aggregate_id.to_string();
        if !reply.correlation_id.is_empty() && reply.correlation_id != expected {
            return Err(RelayError::CorrelationMismatch {
                expected,
                actual: reply.correlation_id,
            });
        }
        Ok(reply)
    }
}

#[async_trait]
impl CommandDispatcher for GrpcCommandDispatcher {
    async fn dispatch(&self, command: DispatchCommand) -> Result<ReplyEnvelope, RelayError> {
        let envelope = EventEnvelope {
            aggregate_id: Uuid::new_v4(),
            aggregate_type: AggregateType::User,
            event_name: command.event_name,
            event_data: command.payload,
            event_date: self.clock.unix_seconds(),
            internal_id: command.internal_id,
        };

        let span = info_span!(
            "relay_dispatch",
            aggregate_id = %envelope.aggregate_id,
            event_name = envelope.event_name.as_str(),
        );
        async {
            info!("dispatching event");
            let reply = self.exchange(&envelope).await?;
            info!(status_code = reply.status_code, "reply received");
            Ok(reply)
        }
        .instrument(span)
        .await
    }
}
