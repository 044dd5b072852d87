//! UserHub API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use userhub_core::error::DomainError;
use userhub_relay::error::RelayError;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The worker endpoint could not be set up.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for locally produced error responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Mirrors the HTTP status.
    pub status_code: u16,
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Errors a request handler can answer with before, or instead of, relaying.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A domain rule or store lookup failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing, invalid or mismatched bearer token.
    #[error("{0}")]
    Unauthorized(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Self::Domain(DomainError::UserNotFound(id)) => (
                StatusCode::BAD_REQUEST,
                "user_not_found",
                format!("No user found with {id}"),
            ),
            Self::Domain(DomainError::Duplicate { .. }) => {
                (StatusCode::BAD_REQUEST, "duplicate", self.to_string())
            }
            Self::Domain(DomainError::ConcurrencyConflict { .. }) => {
                (StatusCode::CONFLICT, "concurrency_conflict", self.to_string())
            }
            Self::Domain(DomainError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error", self.to_string())
            }
            Self::Domain(DomainError::Infrastructure(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "infrastructure_error",
                self.to_string(),
            ),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
