//! UserHub Store: PostgreSQL persistence for users.

pub mod pg_user_repository;
pub mod schema;
