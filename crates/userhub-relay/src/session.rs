//! Stream session lifecycle.
//!
//! A session is one `HandleEvent` call carrying at most one `Event` followed
//! by at most one `Response`. The gateway side is [`StreamSession`]; the
//! worker side reads its single event with [`accept_one`]. Either peer
//! closing early surfaces as a [`RelayError`] on the other, and dropping a
//! session mid-flight cancels the underlying call.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tonic::Streaming;
use tonic::transport::Channel;

use crate::EventRelayClient;
use crate::error::RelayError;
use crate::proto;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Sent,
    Replied,
}

/// Gateway half of one stream session.
#[derive(Debug)]
pub struct StreamSession {
    state: SessionState,
    outbound: Option<mpsc::Sender<proto::Event>>,
    inbound: Streaming<proto::Response>,
}

impl StreamSession {
    /// Opens a new stream on `client`.
    ///
    /// Resolves once the worker has accepted the call. There is no retry: an
    /// unreachable worker fails immediately.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Connect` if the call cannot be established.
    pub async fn open(client: &mut EventRelayClient<Channel>) -> Result<Self, RelayError> {
        let (tx, rx) = mpsc::channel(1);
        let response = client
            .handle_event(ReceiverStream::new(rx))
            .await
            .map_err(|status| RelayError::Connect(status.message().to_owned()))?;

        Ok(Self {
            state: SessionState::Open,
            outbound: Some(tx),
            inbound: response.into_inner(),
        })
    }

    /// Sends the session's single event and half-closes the send side.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Protocol` if an event was already sent and
    /// `RelayError::Send` if the worker has gone away.
    pub async fn send(&mut self, event: proto::Event) -> Result<(), RelayError> {
        if self.state != SessionState::Open {
            return Err(RelayError::Protocol("event already sent on this stream".into()));
        }
        let outbound = self
            .outbound
            .take()
            .ok_or_else(|| RelayError::Protocol("send side already closed".into()))?;
        outbound.send(event).await.map_err(|_| RelayError::Send)?;
        self.state = SessionState::Sent;
        Ok(())
    }

    /// Waits for the session's single reply.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Protocol` if called before [`StreamSession::send`]
    /// or after a reply was already read, `RelayError::ClosedBeforeReply` if
    /// the worker ends the stream without replying, and `RelayError::Receive`
    /// if reading fails.
    pub async fn receive(&mut self) -> Result<proto::Response, RelayError> {
        match self.state {
            SessionState::Open => {
                return Err(RelayError::Protocol("no event sent on this stream".into()));
            }
            SessionState::Replied => {
                return Err(RelayError::Protocol("reply already received".into()));
            }
            SessionState::Sent => {}
        }
        let response = self
            .inbound
            .message()
            .await
            .map_err(RelayError::Receive)?
            .ok_or(RelayError::ClosedBeforeReply)?;
        self.state = SessionState::Replied;
        Ok(response)
    }

    /// Ends the session, releasing the stream.
    pub fn close(self) {
        drop(self);
    }
}

/// Reads the single event of a worker-side session.
///
/// Anything the gateway sends after the first event is ignored.
///
/// # Errors
///
/// Returns `RelayError::ClosedBeforeEvent` if the stream ends first and
/// `RelayError::Receive` if reading fails.
pub async fn accept_one<S>(inbound: &mut S) -> Result<proto::Event, RelayError>
where
    S: Stream<Item = Result<proto::Event, tonic::Status>> + Unpin,
{
    match inbound.next().await {
        Some(Ok(event)) => Ok(event),
        Some(Err(status)) => Err(RelayError::Receive(status)),
        None => Err(RelayError::ClosedBeforeEvent),
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;
    use tonic::{Request, Status};

    use super::*;
    use crate::{EventRelay, EventRelayServer};

    /// Reads the one event of each stream and closes without replying.
    struct SilentRelay;

    #[tonic::async_trait]
    impl EventRelay for SilentRelay {
        type HandleEventStream = ReceiverStream<Result<proto::Response, Status>>;

        async fn handle_event(
            &self,
            request: Request<Streaming<proto::Event>>,
        ) -> Result<tonic::Response<Self::HandleEventStream>, Status> {
            let mut inbound = request.into_inner();
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(async move {
                let _ = accept_one(&mut inbound).await;
                drop(tx);
            });
            Ok(tonic::Response::new(ReceiverStream::new(rx)))
        }
    }

    async fn silent_client() -> EventRelayClient<Channel> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(
            Server::builder()
                .add_service(EventRelayServer::new(SilentRelay))
                .serve_with_incoming(TcpListenerStream::new(listener)),
        );
        EventRelayClient::connect(format!("http://{addr}")).await.unwrap()
    }

    fn event() -> proto::Event {
        proto::Event {
            aggregate_id: "8b62a0c4-5d1e-4f8e-9a57-0c1d2e3f4a5b".into(),
            ..proto::Event::default()
        }
    }

    #[tokio::test]
    async fn test_receive_before_send_is_a_protocol_error() {
        // Arrange
        let mut client = silent_client().await;
        let mut session = StreamSession::open(&mut client).await.unwrap();

        // Act
        let result = session.receive().await;

        // Assert
        assert!(matches!(result, Err(RelayError::Protocol(msg)) if msg == "no event sent on this stream"));
    }

    #[tokio::test]
    async fn test_second_send_is_a_protocol_error() {
        let mut client = silent_client().await;
        let mut session = StreamSession::open(&mut client).await.unwrap();
        session.send(event()).await.unwrap();

        let result = session.send(event()).await;

        assert!(matches!(result, Err(RelayError::Protocol(msg)) if msg == "event already sent on this stream"));
    }

    #[tokio::test]
    async fn test_worker_closing_without_reply_is_reported() {
        let mut client = silent_client().await;
        let mut session = StreamSession::open(&mut client).await.unwrap();
        session.send(event()).await.unwrap();

        let result = session.receive().await;

        assert!(matches!(result, Err(RelayError::ClosedBeforeReply)));
    }

    #[tokio::test]
    async fn test_accept_one_returns_first_event() {
        let first = proto::Event {
            aggregate_id: "first".into(),
            ..proto::Event::default()
        };
        let second = proto::Event {
            aggregate_id: "second".into(),
            ..proto::Event::default()
        };
        let mut inbound = tokio_stream::iter(vec![Ok(first.clone()), Ok(second)]);

        let event = accept_one(&mut inbound).await.unwrap();

        assert_eq!(event, first);
    }

    #[tokio::test]
    async fn test_accept_one_reports_early_close() {
        let mut inbound = tokio_stream::iter(Vec::<Result<proto::Event, tonic::Status>>::new());

        let result = accept_one(&mut inbound).await;

        assert!(matches!(result, Err(RelayError::ClosedBeforeEvent)));
    }

    #[tokio::test]
    async fn test_accept_one_reports_read_failure() {
        let mut inbound = tokio_stream::iter(vec![Err::<proto::Event, _>(
            tonic::Status::cancelled("client went away"),
        )]);

        let result = accept_one(&mut inbound).await;

        assert!(matches!(result, Err(RelayError::Receive(status)) if status.code() == tonic::Code::Cancelled));
    }
}
