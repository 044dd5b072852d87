//! Login route: exchanges a nickname and password for a bearer token.

use axum::body::Bytes;
use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use userhub_users::application::query_handlers;

use super::decode_body;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /token.
#[derive(Deserialize)]
pub struct TokenRequest {
    /// Login nickname.
    pub nickname: String,
    /// Plaintext password.
    pub password: String,
}

/// Response body for a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Signed bearer token.
    pub token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// POST /token
#[instrument(skip_all, fields(nickname = tracing::field::Empty))]
async fn issue_token(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TokenResponse>, ApiError> {
    let request: TokenRequest = decode_body(&body)?;
    tracing::Span::current().record("nickname", request.nickname.as_str());
    let user = query_handlers::verify_credentials(
        &request.nickname,
        &request.password,
        state.user_repository.as_ref(),
        state.hasher.as_ref(),
    )
    .await?
    .ok_or_else(|| {
        warn!("login rejected");
        ApiError::Unauthorized("invalid nickname or password".into())
    })?;

    let token = state.tokens.issue(&user, state.clock.now())?;
    info!(user_id = %user.id, "token issued");

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.tokens.ttl_seconds(),
    }))
}

/// Returns the router for authentication.
pub fn router() -> Router<AppState> {
    Router::new().route("/token", post(issue_token))
}
