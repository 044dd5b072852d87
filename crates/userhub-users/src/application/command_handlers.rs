//! Command handlers for the users context.
//!
//! Each handler validates its input, loads whatever it needs from the
//! repository, applies the change, and persists it. Uniqueness is checked up
//! front for a readable error; the store's unique indexes still have the last
//! word when two writers race.

use tracing::info;
use userhub_core::clock::Clock;
use userhub_core::command::Command;
use userhub_core::error::DomainError;
use userhub_core::hasher::PasswordHasher;
use userhub_core::repository::UserRepository;
use userhub_core::user::User;
use uuid::Uuid;

use crate::domain::commands::{CreateUser, DeleteUser, UpdateUser};

async fn ensure_nickname_free(
    nickname: &str,
    owner: Option<Uuid>,
    repo: &dyn UserRepository,
) -> Result<(), DomainError> {
    match repo.find_by_nickname(nickname).await? {
        Some(existing) if Some(existing.id) != owner => Err(DomainError::Duplicate {
            field: "nickname",
            value: nickname.to_owned(),
        }),
        _ => Ok(()),
    }
}

async fn ensure_email_free(
    email: &str,
    owner: Option<Uuid>,
    repo: &dyn UserRepository,
) -> Result<(), DomainError> {
    match repo.find_by_email(email).await? {
        Some(existing) if Some(existing.id) != owner => Err(DomainError::Duplicate {
            field: "email",
            value: email.to_owned(),
        }),
        _ => Ok(()),
    }
}

/// Handles the `CreateUser` command: validates the document, hashes the
/// password, assigns a fresh id and inserts the user.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an invalid document,
/// `DomainError::Duplicate` if the nickname or e-mail is taken, and
/// `DomainError::Infrastructure` if hashing or persistence fails.
pub async fn handle_create_user(
    command: &CreateUser,
    hasher: &dyn PasswordHasher,
    clock: &dyn Clock,
    repo: &dyn UserRepository,
) -> Result<User, DomainError> {
    let new_user = &command.new_user;
    new_user.validate()?;
    ensure_nickname_free(new_user.nickname.trim(), None, repo).await?;
    ensure_email_free(new_user.email.trim(), None, repo).await?;

    let password_hash = hasher.hash(&new_user.password)?;
    let user = User::register(Uuid::new_v4(), new_user.clone(), password_hash, clock.now());
    repo.insert(&user).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        user_id = %user.id,
        "user created"
    );
    Ok(user)
}

/// Handles the `UpdateUser` command: loads the user, replaces the supplied
/// fields one for one, re-hashes a supplied password, and writes the result
/// guarded by the version that was loaded.
///
/// # Errors
///
/// Returns `DomainError::UserNotFound` if no live user has the id,
/// `DomainError::Validation` for a malformed patch, `DomainError::Duplicate`
/// if the new nickname or e-mail belongs to someone else,
/// `DomainError::ConcurrencyConflict` if the row changed since it was loaded,
/// and `DomainError::Infrastructure` for hashing or persistence failures.
pub async fn handle_update_user(
    command: &UpdateUser,
    hasher: &dyn PasswordHasher,
    clock: &dyn Clock,
    repo: &dyn UserRepository,
) -> Result<User, DomainError> {
    let patch = &command.patch;
    patch.validate()?;

    let mut user = repo
        .find_by_id(command.user_id)
        .await?
        .ok_or(DomainError::UserNotFound(command.user_id))?;

    if let Some(nickname) = patch.nickname() {
        ensure_nickname_free(nickname, Some(user.id), repo).await?;
    }
    if let Some(email) = patch.email() {
        ensure_email_free(email, Some(user.id), repo).await?;
    }

    let expected_version = user.version;
    patch.merge_into(&mut user);
    if let Some(password) = patch.password() {
        user.password_hash = hasher.hash(password)?;
    }
    user.updated_at = clock.now();
    user.version = expected_version + 1;

    repo.update(&user, expected_version).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        user_id = %user.id,
        version = user.version,
        "user updated"
    );
    Ok(user)
}

/// Handles the `DeleteUser` command: soft-deletes a live user.
///
/// # Errors
///
/// Returns `DomainError::UserNotFound` if no live user has the id and
/// `DomainError::Infrastructure` if persistence fails.
pub async fn handle_delete_user(
    command: &DeleteUser,
    clock: &dyn Clock,
    repo: &dyn UserRepository,
) -> Result<(), DomainError> {
    if repo.find_by_id(command.user_id).await?.is_none() {
        return Err(DomainError::UserNotFound(command.user_id));
    }
    repo.soft_delete(command.user_id, clock.now()).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        user_id = %command.user_id,
        "user deleted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use userhub_core::error::DomainError;
    use userhub_core::user::{NewUser, UserPatch};
    use uuid::Uuid;

    use crate::application::command_handlers::{
        handle_create_user, handle_delete_user, handle_update_user,
    };
    use crate::domain::commands::{CreateUser, DeleteUser, UpdateUser};
    use userhub_test_support::{
        FailingUserRepository, FakePasswordHasher, FixedClock, InMemoryUserRepository,
        user_fixture,
    };

    fn create_command(nickname: &str, email: &str) -> CreateUser {
        CreateUser {
            correlation_id: Uuid::new_v4(),
            new_user: NewUser {
                nickname: nickname.into(),
                email: email.into(),
                password: "123".into(),
                country: "UK".into(),
                ..NewUser::default()
            },
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_handle_create_user_persists_hashed_user() {
        // Arrange
        let repo = InMemoryUserRepository::new();
        let command = create_command("test", "user@test.com");

        // Act
        let user = handle_create_user(&command, &FakePasswordHasher, &clock(), &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(repo.live_count(), 1);
        let stored = repo.get(user.id).unwrap();
        assert_eq!(stored.nickname, "test");
        assert_eq!(stored.country, "UK");
        assert_ne!(stored.password_hash, "123");
        assert_eq!(stored.version, 1);
        assert_eq!(stored.created_at, clock().0);
    }

    #[tokio::test]
    async fn test_handle_create_user_rejects_duplicate_nickname() {
        // Arrange
        let repo = InMemoryUserRepository::new();
        repo.seed(user_fixture("test", "other@test.com"));

        // Act
        let result = handle_create_user(
            &create_command("test", "user@test.com"),
            &FakePasswordHasher,
            &clock(),
            &repo,
        )
        .await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::Duplicate {
                field: "nickname",
                ..
            })
        ));
        assert_eq!(repo.live_count(), 1);
    }

    #[tokio::test]
    async fn test_handle_create_user_rejects_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.seed(user_fixture("someone", "user@test.com"));

        let result = handle_create_user(
            &create_command("test", "user@test.com"),
            &FakePasswordHasher,
            &clock(),
            &repo,
        )
        .await;

        assert!(matches!(
            result,
            Err(DomainError::Duplicate { field: "email", .. })
        ));
        assert_eq!(repo.live_count(), 1);
    }

    #[tokio::test]
    async fn test_handle_create_user_rejects_invalid_document_without_touching_store() {
        let repo = FailingUserRepository;

        let result = handle_create_user(
            &create_command("", "nope"),
            &FakePasswordHasher,
            &clock(),
            &repo,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handle_create_user_propagates_infrastructure_failure() {
        let result = handle_create_user(
            &create_command("test", "user@test.com"),
            &FakePasswordHasher,
            &clock(),
            &FailingUserRepository,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_handle_update_user_replaces_fields_and_bumps_version() {
        // Arrange
        let repo = InMemoryUserRepository::new();
        let existing = user_fixture("test", "user@test.com");
        let user_id = existing.id;
        repo.seed(existing);
        let command = UpdateUser {
            correlation_id: Uuid::new_v4(),
            user_id,
            patch: UserPatch {
                nickname: Some("test4".into()),
                last_name: Some("Byron".into()),
                ..UserPatch::default()
            },
        };

        // Act
        let updated = handle_update_user(&command, &FakePasswordHasher, &clock(), &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(updated.nickname, "test4");
        assert_eq!(updated.version, 2);
        let stored = repo.get(user_id).unwrap();
        assert_eq!(stored.nickname, "test4");
        assert_eq!(stored.last_name, "Byron");
        assert_eq!(stored.first_name, "Test");
        assert_eq!(stored.updated_at, clock().0);
    }

    #[tokio::test]
    async fn test_handle_update_user_rehashes_supplied_password() {
        let repo = InMemoryUserRepository::new();
        let existing = user_fixture("test", "user@test.com");
        let user_id = existing.id;
        let old_hash = existing.password_hash.clone();
        repo.seed(existing);
        let command = UpdateUser {
            correlation_id: Uuid::new_v4(),
            user_id,
            patch: UserPatch {
                password: Some("new-secret".into()),
                ..UserPatch::default()
            },
        };

        handle_update_user(&command, &FakePasswordHasher, &clock(), &repo)
            .await
            .unwrap();

        let stored = repo.get(user_id).unwrap();
        assert_ne!(stored.password_hash, old_hash);
        assert_ne!(stored.password_hash, "new-secret");
    }

    #[tokio::test]
    async fn test_handle_update_user_keeps_own_nickname() {
        let repo = InMemoryUserRepository::new();
        let existing = user_fixture("test", "user@test.com");
        let user_id = existing.id;
        repo.seed(existing);
        let command = UpdateUser {
            correlation_id: Uuid::new_v4(),
            user_id,
            patch: UserPatch {
                nickname: Some("test".into()),
                ..UserPatch::default()
            },
        };

        let result = handle_update_user(&command, &FakePasswordHasher, &clock(), &repo).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_handle_update_user_rejects_nickname_of_another_user() {
        let repo = InMemoryUserRepository::new();
        let existing = user_fixture("test", "user@test.com");
        let user_id = existing.id;
        repo.seed(existing);
        repo.seed(user_fixture("taken", "taken@test.com"));
        let command = UpdateUser {
            correlation_id: Uuid::new_v4(),
            user_id,
            patch: UserPatch {
                nickname: Some("taken".into()),
                ..UserPatch::default()
            },
        };

        let result = handle_update_user(&command, &FakePasswordHasher, &clock(), &repo).await;

        assert!(matches!(result, Err(DomainError::Duplicate { .. })));
        assert_eq!(repo.get(user_id).unwrap().nickname, "test");
    }

    #[tokio::test]
    async fn test_handle_update_user_returns_not_found_for_unknown_id() {
        let repo = InMemoryUserRepository::new();
        let user_id = Uuid::new_v4();
        let command = UpdateUser {
            correlation_id: Uuid::new_v4(),
            user_id,
            patch: UserPatch::default(),
        };

        let result = handle_update_user(&command, &FakePasswordHasher, &clock(), &repo).await;

        assert!(matches!(result, Err(DomainError::UserNotFound(id)) if id == user_id));
    }

    #[tokio::test]
    async fn test_handle_delete_user_soft_deletes() {
        // Arrange
        let repo = InMemoryUserRepository::new();
        let existing = user_fixture("test", "user@test.com");
        let user_id = existing.id;
        repo.seed(existing);

        // Act
        handle_delete_user(
            &DeleteUser {
                correlation_id: Uuid::new_v4(),
                user_id,
            },
            &clock(),
            &repo,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(repo.live_count(), 0);
        assert!(repo.get(user_id).is_none());
        assert_eq!(repo.deleted_at(user_id), Some(clock().0));
    }

    #[tokio::test]
    async fn test_handle_delete_user_unknown_id_leaves_store_unchanged() {
        let repo = InMemoryUserRepository::new();
        repo.seed(user_fixture("test", "user@test.com"));

        let result = handle_delete_user(
            &DeleteUser {
                correlation_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
            },
            &clock(),
            &repo,
        )
        .await;

        assert!(matches!(result, Err(DomainError::UserNotFound(_))));
        assert_eq!(repo.live_count(), 1);
    }
}
