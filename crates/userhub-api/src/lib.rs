//! UserHub HTTP gateway.
//!
//! Reads are answered straight from the store; creates, updates and deletes
//! are relayed to the worker, one stream per request.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router over `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/user", routes::users::router())
        .nest("/api/v1/auth", routes::auth::router())
        .with_state(state)
}
