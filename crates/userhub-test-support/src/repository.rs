//! Test repositories: `UserRepository` implementations for tests.

use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use userhub_core::clock::Clock;
use userhub_core::error::DomainError;
use userhub_core::pagination::{FilterField, Page, PageRequest, SortColumn, SortDirection};
use userhub_core::repository::UserRepository;
use userhub_core::user::User;
use uuid::Uuid;

use crate::clock::FixedClock;

/// A live user with nickname and e-mail as given, password `123` hashed by
/// [`crate::FakePasswordHasher`], first name `Test`, last name `User`, country
/// `UK`, version 1.
#[must_use]
pub fn user_fixture(nickname: &str, email: &str) -> User {
    let now = FixedClock::default().now();
    User {
        id: Uuid::new_v4(),
        nickname: nickname.to_owned(),
        email: email.to_owned(),
        password_hash: "hashed:123".to_owned(),
        first_name: "Test".to_owned(),
        last_name: "User".to_owned(),
        country: "UK".to_owned(),
        created_at: now,
        updated_at: now,
        version: 1,
    }
}

#[derive(Debug, Clone)]
struct Row {
    user: User,
    deleted_at: Option<DateTime<Utc>>,
}

impl Row {
    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// An in-memory repository with the same live-row semantics as the
/// PostgreSQL one: uniqueness among live rows, soft delete, version checks,
/// and filtered, sorted paging.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<Vec<Row>>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `user` as a live row without any checks.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed(&self, user: User) {
        self.rows.lock().unwrap().push(Row {
            user,
            deleted_at: None,
        });
    }

    /// Number of live rows.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn live_count(&self) -> usize {
        self.rows.lock().unwrap().iter().filter(|r| r.is_live()).count()
    }

    /// The live user with `id`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn get(&self, id: Uuid) -> Option<User> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.is_live() && r.user.id == id)
            .map(|r| r.user.clone())
    }

    /// When the user with `id` was soft-deleted, if it was.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn deleted_at(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.id == id)
            .and_then(|r| r.deleted_at)
    }
}

fn check_unique(rows: &[Row], candidate: &User) -> Result<(), DomainError> {
    for row in rows.iter().filter(|r| r.is_live() && r.user.id != candidate.id) {
        if row.user.nickname == candidate.nickname {
            return Err(DomainError::Duplicate {
                field: "nickname",
                value: candidate.nickname.clone(),
            });
        }
        if row.user.email == candidate.email {
            return Err(DomainError::Duplicate {
                field: "email",
                value: candidate.email.clone(),
            });
        }
    }
    Ok(())
}

fn filter_value(user: &User, field: FilterField) -> &str {
    match field {
        FilterField::Country => &user.country,
        FilterField::Nickname => &user.nickname,
        FilterField::Email => &user.email,
        FilterField::FirstName => &user.first_name,
        FilterField::LastName => &user.last_name,
    }
}

fn compare(a: &User, b: &User, column: SortColumn, direction: SortDirection) -> Ordering {
    let by_column = match column {
        SortColumn::Country => a.country.cmp(&b.country),
        SortColumn::Nickname => a.nickname.cmp(&b.nickname),
        SortColumn::Email => a.email.cmp(&b.email),
        SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        SortColumn::FirstName => a.first_name.cmp(&b.first_name),
        SortColumn::LastName => a.last_name.cmp(&b.last_name),
    };
    let by_column = match direction {
        SortDirection::Asc => by_column,
        SortDirection::Desc => by_column.reverse(),
    };
    by_column.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        check_unique(&rows, user)?;
        rows.push(Row {
            user: user.clone(),
            deleted_at: None,
        });
        Ok(())
    }

    async fn update(&self, user: &User, expected_version: i64) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        check_unique(&rows, user)?;
        let row = rows
            .iter_mut()
            .find(|r| r.is_live() && r.user.id == user.id)
            .ok_or(DomainError::UserNotFound(user.id))?;
        if row.user.version != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                user_id: user.id,
                expected: expected_version,
            });
        }
        row.user = user.clone();
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.is_live() && r.user.id == id)
            .ok_or(DomainError::UserNotFound(id))?;
        row.deleted_at = Some(at);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.is_live() && r.user.nickname == nickname)
            .map(|r| r.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.is_live() && r.user.email == email)
            .map(|r| r.user.clone()))
    }

    async fn list(&self, request: &PageRequest) -> Result<Page<User>, DomainError> {
        let mut matching: Vec<User> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_live())
            .filter(|r| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|f| filter_value(&r.user, f.field) == f.value)
            })
            .map(|r| r.user.clone())
            .collect();
        matching.sort_by(|a, b| compare(a, b, request.sort_column, request.sort_direction));

        let total_rows = matching.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let rows = matching
            .into_iter()
            .skip(offset)
            .take(request.limit as usize)
            .collect();
        Ok(Page::new(request, total_rows, rows))
    }
}

/// A repository whose every operation fails with an infrastructure error.
#[derive(Debug, Clone, Copy)]
pub struct FailingUserRepository;

fn unavailable<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl UserRepository for FailingUserRepository {
    async fn insert(&self, _user: &User) -> Result<(), DomainError> {
        unavailable()
    }

    async fn update(&self, _user: &User, _expected_version: i64) -> Result<(), DomainError> {
        unavailable()
    }

    async fn soft_delete(&self, _id: Uuid, _at: DateTime<Utc>) -> Result<(), DomainError> {
        unavailable()
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, DomainError> {
        unavailable()
    }

    async fn find_by_nickname(&self, _nickname: &str) -> Result<Option<User>, DomainError> {
        unavailable()
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, DomainError> {
        unavailable()
    }

    async fn list(&self, _request: &PageRequest) -> Result<Page<User>, DomainError> {
        unavailable()
    }
}
