//! `EventRelay` gRPC server and accept loop.

use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};
use tracing::{Instrument, info, info_span, warn};
use userhub_core::error::DomainError;
use userhub_core::event::ReplyEnvelope;
use userhub_relay::{EventRelay, EventRelayServer, codec, proto, session};

use crate::handler::UserEventHandler;

/// Serves one stream: reads its single event, answers it, and returns.
///
/// A stream that ends or fails before an event arrives is released without a
/// reply and without touching the store. A reply that cannot be written is
/// logged; anything already committed stays committed.
pub async fn serve_stream<S>(
    handler: UserEventHandler,
    mut inbound: S,
    outbound: mpsc::Sender<Result<proto::Response, Status>>,
) where
    S: Stream<Item = Result<proto::Event, Status>> + Unpin,
{
    let event = match session::accept_one(&mut inbound).await {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "stream released without an event");
            return;
        }
    };

    let raw_aggregate_id = event.aggregate_id.clone();
    let reply = match codec::decode_event(event) {
        Ok(envelope) => {
            let span = info_span!(
                "relay_stream",
                aggregate_id = %envelope.aggregate_id,
                event_name = envelope.event_name.as_str(),
            );
            handler.handle(&envelope).instrument(span).await
        }
        Err(err) => {
            warn!(aggregate_id = %raw_aggregate_id, error = %err, "undecodable event");
            ReplyEnvelope::from_error(&DomainError::Validation(err.to_string()))
                .correlated_with(raw_aggregate_id)
        }
    };

    if outbound.send(Ok(codec::encode_reply(reply))).await.is_err() {
        warn!("gateway went away before the reply was written");
    }
}

/// The `EventRelay` service: one spawned task per accepted stream.
#[derive(Clone)]
pub struct EventRelayService {
    handler: UserEventHandler,
}

impl EventRelayService {
    /// Creates the service around `handler`.
    #[must_use]
    pub fn new(handler: UserEventHandler) -> Self {
        Self { handler }
    }
}

#[tonic::async_trait]
impl EventRelay for EventRelayService {
    type HandleEventStream = ReceiverStream<Result<proto::Response, Status>>;

    async fn handle_event(
        &self,
        request: Request<Streaming<proto::Event>>,
    ) -> Result<Response<Self::HandleEventStream>, Status> {
        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(serve_stream(self.handler.clone(), inbound, tx));
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// Accepts streams on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the transport error that ended the accept loop.
pub async fn serve(
    listener: TcpListener,
    handler: UserEventHandler,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<(), tonic::transport::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "event relay listening");
    }
    Server::builder()
        .add_service(EventRelayServer::new(EventRelayService::new(handler)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
}
