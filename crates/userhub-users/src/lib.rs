//! UserHub: users bounded context.
//!
//! Responsible for registering, patching and soft-deleting users, for the
//! read-side views served straight from the store, and for checking login
//! credentials.

pub mod application {
    pub mod command_handlers;
    pub mod query_handlers;
}

pub mod domain {
    pub mod commands;
    pub mod password;
}
