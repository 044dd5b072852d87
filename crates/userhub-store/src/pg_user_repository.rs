//! `PostgreSQL` implementation of the `UserRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use userhub_core::error::DomainError;
use userhub_core::pagination::{Page, PageRequest};
use userhub_core::repository::UserRepository;
use userhub_core::user::User;

const USER_COLUMNS: &str = "id, nickname, email, password_hash, first_name, last_name, country, \
                            created_at, updated_at, version";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    nickname: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    country: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            nickname: row.nickname,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            country: row.country,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

fn infrastructure(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

/// Maps a write failure, turning a unique-index violation into `Duplicate`.
fn map_write_error(err: &sqlx::Error, user: &User) -> DomainError {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return match db_err.constraint() {
                Some("users_email_live_key") => DomainError::Duplicate {
                    field: "email",
                    value: user.email.clone(),
                },
                Some("users_nickname_live_key") => DomainError::Duplicate {
                    field: "nickname",
                    value: user.nickname.clone(),
                },
                _ => DomainError::Duplicate {
                    field: "id",
                    value: user.id.to_string(),
                },
            };
        }
    }
    infrastructure(err)
}

fn push_live_filter(builder: &mut QueryBuilder<'_, Postgres>, request: &PageRequest) {
    builder.push(" WHERE deleted_at IS NULL");
    if let Some(filter) = &request.filter {
        builder
            .push(" AND ")
            .push(filter.field.column())
            .push(" = ")
            .push_bind(filter.value.clone());
    }
}

/// PostgreSQL-backed user repository.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Creates a new `PgUserRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_live_by(&self, column: &str, value: &str) -> Result<Option<User>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder
            .push(USER_COLUMNS)
            .push(" FROM users WHERE deleted_at IS NULL AND ")
            .push(column)
            .push(" = ")
            .push_bind(value.to_owned());

        builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(|e| infrastructure(&e))
    }

    async fn is_live(&self, id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO users (id, nickname, email, password_hash, first_name, last_name, \
             country, created_at, updated_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.country)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.version)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(&e, user))?;

        debug!(user_id = %user.id, "user row inserted");
        Ok(())
    }

    async fn update(&self, user: &User, expected_version: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE users SET nickname = $1, email = $2, password_hash = $3, first_name = $4, \
             last_name = $5, country = $6, updated_at = $7, version = $8 \
             WHERE id = $9 AND version = $10 AND deleted_at IS NULL",
        )
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.country)
        .bind(user.updated_at)
        .bind(user.version)
        .bind(user.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(&e, user))?;

        if result.rows_affected() == 0 {
            return Err(if self.is_live(user.id).await? {
                DomainError::ConcurrencyConflict {
                    user_id: user.id,
                    expected: expected_version,
                }
            } else {
                DomainError::UserNotFound(user.id)
            });
        }

        debug!(user_id = %user.id, version = user.version, "user row updated");
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = $2, updated_at = $2, version = version + 1 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(id));
        }
        debug!(user_id = %id, "user row soft-deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder
            .push(USER_COLUMNS)
            .push(" FROM users WHERE deleted_at IS NULL AND id = ")
            .push_bind(id);

        builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(|e| infrastructure(&e))
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DomainError> {
        self.find_live_by("nickname", nickname).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.find_live_by("email", email).await
    }

    async fn list(&self, request: &PageRequest) -> Result<Page<User>, DomainError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_live_filter(&mut count, request);
        let total_rows: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;

        let offset = i64::try_from(request.offset())
            .map_err(|_| DomainError::Validation("page is out of range".into()))?;
        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(USER_COLUMNS).push(" FROM users");
        push_live_filter(&mut select, request);
        select
            .push(" ORDER BY ")
            .push(request.sort_column.column())
            .push(" ")
            .push(request.sort_direction.keyword())
            .push(", id ASC LIMIT ")
            .push_bind(i64::from(request.limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = select
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;

        Ok(Page::new(
            request,
            u64::try_from(total_rows).unwrap_or_default(),
            rows.into_iter().map(User::from).collect(),
        ))
    }
}
