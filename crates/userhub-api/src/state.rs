//! Shared application state.

use std::sync::Arc;

use userhub_core::clock::Clock;
use userhub_core::hasher::PasswordHasher;
use userhub_core::repository::UserRepository;
use userhub_relay::dispatcher::CommandDispatcher;

use crate::auth::TokenService;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read side of the user store.
    pub user_repository: Arc<dyn UserRepository>,
    /// Relays mutations to the worker.
    pub dispatcher: Arc<dyn CommandDispatcher>,
    /// Verifies login passwords.
    pub hasher: Arc<dyn PasswordHasher>,
    /// Issues and verifies bearer tokens.
    pub tokens: Arc<TokenService>,
    /// Time source for token issuance.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        dispatcher: Arc<dyn CommandDispatcher>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            dispatcher,
            hasher,
            tokens,
            clock,
        }
    }
}
