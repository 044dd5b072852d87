pub mod auth;
pub mod health;
pub mod users;

use serde::de::DeserializeOwned;
use userhub_core::error::DomainError;

use crate::error::ApiError;

/// Decodes a JSON request body, reporting failures as validation errors.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| DomainError::Validation(format!("malformed request body: {e}")).into())
}
