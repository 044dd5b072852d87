//! End-to-end relay tests: a real gateway dispatcher talking to a real worker
//! server over TCP, backed by the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Status, Streaming};
use userhub_core::event::EventName;
use userhub_relay::dispatcher::{
    CommandDispatcher, DispatchCommand, GrpcCommandDispatcher, RelayClientConfig, dispatch_command,
};
use userhub_relay::error::RelayError;
use userhub_relay::{EventRelay, EventRelayServer, proto, session};
use userhub_test_support::{FakePasswordHasher, FixedClock, InMemoryUserRepository, user_fixture};
use userhub_worker::handler::UserEventHandler;
use userhub_worker::server;
use uuid::Uuid;

struct Harness {
    repo: Arc<InMemoryUserRepository>,
    dispatcher: GrpcCommandDispatcher,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<Result<(), tonic::transport::Error>>,
}

impl Harness {
    async fn start() -> Self {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handler = UserEventHandler::new(
            repo.clone(),
            Arc::new(FakePasswordHasher),
            Arc::new(FixedClock::default()),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(server::serve(listener, handler, async {
            let _ = rx.await;
        }));

        let dispatcher = GrpcCommandDispatcher::connect_lazy(
            &RelayClientConfig {
                endpoint: format!("http://{addr}"),
                connect_timeout: Duration::from_secs(5),
            },
            Arc::new(FixedClock::default()),
        )
        .unwrap();

        Self {
            repo,
            dispatcher,
            shutdown: Some(tx),
            server,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.server.await.unwrap().unwrap();
    }
}

fn create(body: &str) -> DispatchCommand {
    DispatchCommand {
        event_name: EventName::Created,
        internal_id: None,
        payload: body.as_bytes().to_vec(),
    }
}

const CREATE_BODY: &str =
    r#"{"nickname":"test","email":"user@test.com","password":"123","country":"UK"}"#;

#[tokio::test]
async fn test_create_round_trip_returns_public_view() {
    // Arrange
    let harness = Harness::start().await;

    // Act
    let outcome = dispatch_command(&harness.dispatcher, create(CREATE_BODY)).await;

    // Assert
    assert_eq!(outcome.status, 201);
    assert_eq!(outcome.body.message.as_deref(), Some("User created!"));
    let data = outcome.body.data.unwrap();
    assert_eq!(data["nickname"], "test");
    assert_eq!(data["country"], "UK");
    assert!(data.get("password").is_none());
    assert!(data.get("password_hash").is_none());
    assert_eq!(harness.repo.live_count(), 1);

    harness.stop().await;
}

#[tokio::test]
async fn test_reply_is_correlated_with_the_sent_event() {
    let harness = Harness::start().await;

    let reply = harness.dispatcher.dispatch(create(CREATE_BODY)).await.unwrap();

    assert_eq!(reply.status_code, 201);
    assert!(Uuid::parse_str(&reply.correlation_id).is_ok());

    harness.stop().await;
}

#[tokio::test]
async fn test_duplicate_create_passes_worker_error_through() {
    let harness = Harness::start().await;
    dispatch_command(&harness.dispatcher, create(CREATE_BODY)).await;

    let outcome = dispatch_command(&harness.dispatcher, create(CREATE_BODY)).await;

    assert_eq!(outcome.status, 400);
    assert_eq!(
        outcome.body.message.as_deref(),
        Some("a user with the same nickname already exists (test)")
    );
    assert_eq!(harness.repo.live_count(), 1);

    harness.stop().await;
}

#[tokio::test]
async fn test_update_and_delete_round_trip() {
    // Arrange
    let harness = Harness::start().await;
    let existing = user_fixture("test", "user@test.com");
    let user_id = existing.id;
    harness.repo.seed(existing);

    // Act
    let updated = dispatch_command(
        &harness.dispatcher,
        DispatchCommand {
            event_name: EventName::Updated,
            internal_id: Some(user_id),
            payload: br#"{"nickname":"test4"}"#.to_vec(),
        },
    )
    .await;
    let deleted = dispatch_command(
        &harness.dispatcher,
        DispatchCommand {
            event_name: EventName::Deleted,
            internal_id: Some(user_id),
            payload: Vec::new(),
        },
    )
    .await;

    // Assert
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body.message.as_deref(), Some("User updated!"));
    assert_eq!(updated.body.data.unwrap()["nickname"], "test4");
    assert_eq!(deleted.status, 200);
    assert_eq!(deleted.body.message.as_deref(), Some("User successfully deleted!"));
    assert_eq!(harness.repo.live_count(), 0);

    harness.stop().await;
}

#[tokio::test]
async fn test_delete_unknown_user_is_a_400_and_changes_nothing() {
    let harness = Harness::start().await;
    harness.repo.seed(user_fixture("test", "user@test.com"));
    let missing = Uuid::new_v4();

    let outcome = dispatch_command(
        &harness.dispatcher,
        DispatchCommand {
            event_name: EventName::Deleted,
            internal_id: Some(missing),
            payload: Vec::new(),
        },
    )
    .await;

    assert_eq!(outcome.status, 400);
    assert_eq!(
        outcome.body.message,
        Some(format!("no user found with {missing}"))
    );
    assert_eq!(harness.repo.live_count(), 1);

    harness.stop().await;
}

#[tokio::test]
async fn test_concurrent_dispatches_each_get_their_own_reply() {
    let harness = Harness::start().await;

    let creates = (0..8).map(|i| {
        let dispatcher = harness.dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .dispatch(create(&format!(
                    r#"{{"nickname":"user{i}","email":"user{i}@test.com","password":"pw"}}"#
                )))
                .await
        })
    });
    let mut statuses = Vec::new();
    for handle in creates {
        statuses.push(handle.await.unwrap().unwrap().status_code);
    }

    assert!(statuses.iter().all(|s| *s == 201));
    assert_eq!(harness.repo.live_count(), 8);

    harness.stop().await;
}

#[tokio::test]
async fn test_stopped_worker_maps_to_transport_error() {
    let harness = Harness::start().await;
    let dispatcher = harness.dispatcher.clone();
    harness.stop().await;

    let outcome = dispatch_command(&dispatcher, create(CREATE_BODY)).await;

    assert_eq!(outcome.status, 400);
    assert!(outcome.body.message.unwrap().starts_with("failed to open stream to worker"));
}

/// How a misbehaving worker answers the one event it reads.
#[derive(Clone, Copy)]
enum Misbehaviour {
    CloseWithoutReply,
    ForeignCorrelation,
}

struct MisbehavingRelay(Misbehaviour);

#[tonic::async_trait]
impl EventRelay for MisbehavingRelay {
    type HandleEventStream = ReceiverStream<Result<proto::Response, Status>>;

    async fn handle_event(
        &self,
        request: Request<Streaming<proto::Event>>,
    ) -> Result<tonic::Response<Self::HandleEventStream>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(1);
        let behaviour = self.0;
        tokio::spawn(async move {
            if session::accept_one(&mut inbound).await.is_err() {
                return;
            }
            if let Misbehaviour::ForeignCorrelation = behaviour {
                let _ = tx
                    .send(Ok(proto::Response {
                        status_code: 201,
                        message: "user created".into(),
                        data: Vec::new(),
                        correlation_id: "other".into(),
                    }))
                    .await;
            }
        });
        Ok(tonic::Response::new(ReceiverStream::new(rx)))
    }
}

async fn misbehaving_dispatcher(behaviour: Misbehaviour) -> GrpcCommandDispatcher {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(
        Server::builder()
            .add_service(EventRelayServer::new(MisbehavingRelay(behaviour)))
            .serve_with_incoming(TcpListenerStream::new(listener)),
    );
    GrpcCommandDispatcher::connect_lazy(
        &RelayClientConfig {
            endpoint: format!("http://{addr}"),
            connect_timeout: Duration::from_secs(5),
        },
        Arc::new(FixedClock::default()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_worker_closing_without_reply_is_a_transport_error() {
    // Arrange
    let dispatcher = misbehaving_dispatcher(Misbehaviour::CloseWithoutReply).await;

    // Act
    let result = dispatcher.dispatch(create(CREATE_BODY)).await;
    let outcome = dispatch_command(&dispatcher, create(CREATE_BODY)).await;

    // Assert
    assert!(matches!(result, Err(RelayError::ClosedBeforeReply)));
    assert_eq!(outcome.status, 400);
    assert_eq!(
        outcome.body.message.as_deref(),
        Some("worker closed the stream before replying")
    );
}

#[tokio::test]
async fn test_reply_for_another_event_is_rejected() {
    let dispatcher = misbehaving_dispatcher(Misbehaviour::ForeignCorrelation).await;

    let result = dispatcher.dispatch(create(CREATE_BODY)).await;
    let outcome = dispatch_command(&dispatcher, create(CREATE_BODY)).await;

    match result {
        Err(RelayError::CorrelationMismatch { expected, actual }) => {
            assert!(Uuid::parse_str(&expected).is_ok());
            assert_eq!(actual, "other");
        }
        other => panic!("expected a correlation mismatch, got {other:?}"),
    }
    assert_eq!(outcome.status, 400);
}
