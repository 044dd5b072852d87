//! Query handlers for the users context.
//!
//! Reads are served straight from the repository and returned as public
//! views, so a password hash never leaves this module.

use userhub_core::error::DomainError;
use userhub_core::hasher::PasswordHasher;
use userhub_core::pagination::{Page, PageRequest};
use userhub_core::repository::UserRepository;
use userhub_core::user::{User, UserView};
use uuid::Uuid;

/// Retrieves a live user by id.
///
/// # Errors
///
/// Returns `DomainError::UserNotFound` if no live user has the id.
pub async fn get_user_by_id(
    user_id: Uuid,
    repo: &dyn UserRepository,
) -> Result<UserView, DomainError> {
    repo.find_by_id(user_id)
        .await?
        .map(UserView::from)
        .ok_or(DomainError::UserNotFound(user_id))
}

/// Lists one page of live users.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store query fails.
pub async fn list_users(
    request: &PageRequest,
    repo: &dyn UserRepository,
) -> Result<Page<UserView>, DomainError> {
    Ok(repo.list(request).await?.map(UserView::from))
}

/// Checks a nickname/password pair.
///
/// Returns the user on a match and `None` when the nickname is unknown or the
/// password is wrong; callers cannot tell the two apart.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the lookup fails or the stored
/// hash is unreadable.
pub async fn verify_credentials(
    nickname: &str,
    password: &str,
    repo: &dyn UserRepository,
    hasher: &dyn PasswordHasher,
) -> Result<Option<User>, DomainError> {
    let Some(user) = repo.find_by_nickname(nickname.trim()).await? else {
        return Ok(None);
    };
    if hasher.verify(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}
