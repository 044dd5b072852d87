//! Worker event handler.
//!
//! Turns one decoded event into exactly one reply. Every failure, from a
//! malformed payload to a store outage, becomes a reply with
//! `status_code >= 400`; the handler itself never fails.

use std::sync::Arc;

use tracing::{info, warn};
use userhub_core::clock::Clock;
use userhub_core::error::DomainError;
use userhub_core::event::{EventEnvelope, EventName, ReplyEnvelope, STATUS_CREATED, STATUS_OK};
use userhub_core::hasher::PasswordHasher;
use userhub_core::repository::UserRepository;
use userhub_core::user::{NewUser, User, UserPatch};
use userhub_users::application::command_handlers::{
    handle_create_user, handle_delete_user, handle_update_user,
};
use userhub_users::domain::commands::{CreateUser, DeleteUser, UpdateUser};

/// Applies relayed events to the user store.
#[derive(Clone)]
pub struct UserEventHandler {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

fn user_payload(user: &User) -> Result<Vec<u8>, DomainError> {
    serde_json::to_vec(user)
        .map_err(|e| DomainError::Infrastructure(format!("user serialization failed: {e}")))
}

impl UserEventHandler {
    /// Creates a handler over the given store, hasher and clock.
    #[must_use]
    pub fn new(
        repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            hasher,
            clock,
        }
    }

    /// Handles `event` and returns its reply, stamped with the event's
    /// `aggregate_id`.
    pub async fn handle(&self, event: &EventEnvelope) -> ReplyEnvelope {
        let result = match event.event_name {
            EventName::Created => self.on_created(event).await,
            EventName::Updated => self.on_updated(event).await,
            EventName::Deleted => self.on_deleted(event).await,
        };

        let reply = result.unwrap_or_else(|err| {
            warn!(
                aggregate_id = %event.aggregate_id,
                event_name = event.event_name.as_str(),
                error = %err,
                "event rejected"
            );
            ReplyEnvelope::from_error(&err)
        });
        reply.correlated_with(event.aggregate_id.to_string())
    }

    async fn on_created(&self, event: &EventEnvelope) -> Result<ReplyEnvelope, DomainError> {
        let new_user: NewUser = event.decode_data()?;
        let command = CreateUser {
            correlation_id: event.aggregate_id,
            new_user,
        };
        let user = handle_create_user(
            &command,
            self.hasher.as_ref(),
            self.clock.as_ref(),
            self.repo.as_ref(),
        )
        .await?;

        info!(aggregate_id = %event.aggregate_id, user_id = %user.id, "created event applied");
        Ok(ReplyEnvelope::success(
            STATUS_CREATED,
            "user created",
            user_payload(&user)?,
        ))
    }

    async fn on_updated(&self, event: &EventEnvelope) -> Result<ReplyEnvelope, DomainError> {
        let user_id = event.target()?;
        let patch: UserPatch = event.decode_data()?;
        let command = UpdateUser {
            correlation_id: event.aggregate_id,
            user_id,
            patch,
        };
        let user = handle_update_user(
            &command,
            self.hasher.as_ref(),
            self.clock.as_ref(),
            self.repo.as_ref(),
        )
        .await?;

        info!(aggregate_id = %event.aggregate_id, user_id = %user.id, "updated event applied");
        Ok(ReplyEnvelope::success(STATUS_OK, "user updated", user_payload(&user)?))
    }

    async fn on_deleted(&self, event: &EventEnvelope) -> Result<ReplyEnvelope, DomainError> {
        let user_id = event.target()?;
        let command = DeleteUser {
            correlation_id: event.aggregate_id,
            user_id,
        };
        handle_delete_user(&command, self.clock.as_ref(), self.repo.as_ref()).await?;

        info!(aggregate_id = %event.aggregate_id, user_id = %user_id, "deleted event applied");
        Ok(ReplyEnvelope::success(STATUS_OK, "user deleted", Vec::new()))
    }
}
