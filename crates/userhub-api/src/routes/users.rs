//! Routes for the user resource.
//!
//! Reads go straight to the store. Creates, updates and deletes are checked
//! here, then relayed to the worker over a fresh stream; the worker's reply
//! decides the response.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use userhub_core::error::DomainError;
use userhub_core::event::EventName;
use userhub_core::pagination::{ListParams, PageRequest};
use userhub_core::user::{NewUser, UserPatch};
use userhub_relay::dispatcher::{DispatchCommand, dispatch_command};
use userhub_relay::outcome::{DispatchOutcome, ResponseBody};
use userhub_users::application::query_handlers;

use super::decode_body;
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| DomainError::Validation(format!("invalid user id: {raw}")).into())
}

fn ok_with(data: impl serde::Serialize) -> Result<Json<ResponseBody>, ApiError> {
    let data = serde_json::to_value(data)
        .map_err(|e| DomainError::Infrastructure(format!("response serialization failed: {e}")))?;
    Ok(Json(ResponseBody {
        status_code: StatusCode::OK.as_u16(),
        message: None,
        data: Some(data),
    }))
}

fn outcome_response(outcome: DispatchOutcome) -> Response {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.body)).into_response()
}

async fn relay(state: &AppState, command: DispatchCommand) -> Response {
    let outcome = dispatch_command(state.dispatcher.as_ref(), command).await;
    info!(status = outcome.status, "relayed command resolved");
    outcome_response(outcome)
}

/// POST /
#[instrument(skip_all)]
async fn create_user(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let new_user: NewUser = decode_body(&body)?;
    new_user.validate()?;

    info!(nickname = %new_user.nickname.trim(), "relaying create");

    Ok(relay(
        &state,
        DispatchCommand {
            event_name: EventName::Created,
            internal_id: None,
            payload: body.to_vec(),
        },
    )
    .await)
}

/// PUT /{id}
#[instrument(skip(state, caller, body), fields(user_id = %id))]
async fn update_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&id)?;
    caller.ensure_owner(user_id)?;
    let patch: UserPatch = decode_body(&body)?;
    patch.validate()?;

    info!("relaying update");

    Ok(relay(
        &state,
        DispatchCommand {
            event_name: EventName::Updated,
            internal_id: Some(user_id),
            payload: body.to_vec(),
        },
    )
    .await)
}

/// DELETE /{id}
#[instrument(skip(state, caller), fields(user_id = %id))]
async fn delete_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&id)?;
    caller.ensure_owner(user_id)?;

    info!("relaying delete");

    Ok(relay(
        &state,
        DispatchCommand {
            event_name: EventName::Deleted,
            internal_id: Some(user_id),
            payload: Vec::new(),
        },
    )
    .await)
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResponseBody>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let view = query_handlers::get_user_by_id(user_id, state.user_repository.as_ref()).await?;
    ok_with(view)
}

/// GET /
#[instrument(skip_all)]
async fn list_users(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ResponseBody>, ApiError> {
    let Query(params) =
        params.map_err(|e| DomainError::Validation(format!("invalid query string: {e}")))?;
    let request = PageRequest::from_params(params)?;

    let page = query_handlers::list_users(&request, state.user_repository.as_ref()).await?;
    info!(
        page = page.page,
        limit = page.limit,
        total_rows = page.total_rows,
        "listed users"
    );
    ok_with(page)
}

/// Returns the router for the user resource.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}
