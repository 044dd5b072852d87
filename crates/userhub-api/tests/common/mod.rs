//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceExt;
use userhub_api::auth::TokenService;
use userhub_api::state::AppState;
use userhub_core::user::User;
use userhub_relay::dispatcher::{GrpcCommandDispatcher, RelayClientConfig};
use userhub_store::pg_user_repository::PgUserRepository;
use userhub_test_support::{FakePasswordHasher, FixedClock};
use userhub_worker::handler::UserEventHandler;
use userhub_worker::server;

/// A gateway router wired to a live worker, both over the same database.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub tokens: Arc<TokenService>,
    _worker_shutdown: oneshot::Sender<()>,
}

impl TestApp {
    /// Issues a token for `user`, valid from now.
    pub fn token_for(&self, user: &User) -> String {
        self.tokens.issue(user, Utc::now()).unwrap()
    }

    /// Counts rows in `users`, soft-deleted ones included.
    pub async fn row_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// Starts a worker on an ephemeral port and builds the gateway router the
/// same way `main.rs` does, minus the HTTP layers.
pub async fn build_test_app(pool: PgPool) -> TestApp {
    let clock = Arc::new(FixedClock(Utc::now()));
    let repository = Arc::new(PgUserRepository::new(pool.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handler = UserEventHandler::new(repository.clone(), Arc::new(FakePasswordHasher), clock.clone());
    tokio::spawn(server::serve(listener, handler, async {
        let _ = rx.await;
    }));

    let dispatcher = GrpcCommandDispatcher::connect_lazy(
        &RelayClientConfig {
            endpoint: format!("http://{addr}"),
            connect_timeout: Duration::from_secs(5),
        },
        clock.clone(),
    )
    .unwrap();
    let tokens = Arc::new(TokenService::new(b"integration-secret", Duration::from_secs(600)));
    let state = AppState::new(
        repository,
        Arc::new(dispatcher),
        Arc::new(FakePasswordHasher),
        tokens.clone(),
        clock,
    );

    TestApp {
        router: userhub_api::app(state),
        pool,
        tokens,
        _worker_shutdown: tx,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body).unwrap()
}

/// Send a GET request and return status + parsed JSON body.
pub async fn get_json(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    send(app, request("GET", uri, None, Body::empty())).await
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: &TestApp, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(app, request("POST", uri, None, Body::from(body.to_string()))).await
}

/// Send a PUT request with a JSON body and an optional bearer token.
pub async fn put_json(
    app: &TestApp,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, request("PUT", uri, token, Body::from(body.to_string()))).await
}

/// Send a DELETE request with an optional bearer token.
pub async fn delete(app: &TestApp, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request("DELETE", uri, token, Body::empty())).await
}
