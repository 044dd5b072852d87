//! User repository abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::pagination::{Page, PageRequest};
use crate::user::User;

/// Durable storage for users.
///
/// Every read and write only sees live rows: a soft-deleted user is
/// indistinguishable from one that never existed.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user.
    ///
    /// Fails with `DomainError::Duplicate` if a live user already holds the
    /// nickname or e-mail.
    async fn insert(&self, user: &User) -> Result<(), DomainError>;

    /// Overwrite a live user's attributes.
    ///
    /// `expected_version` is the version the caller loaded; the write fails
    /// with `DomainError::ConcurrencyConflict` if the stored version differs.
    /// `user.version` is the version to store.
    async fn update(&self, user: &User, expected_version: i64) -> Result<(), DomainError>;

    /// Mark a live user as deleted at `at`.
    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Load a live user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Load a live user by nickname.
    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DomainError>;

    /// Load a live user by e-mail.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// One filtered, sorted page of live users.
    async fn list(&self, request: &PageRequest) -> Result<Page<User>, DomainError>;
}
