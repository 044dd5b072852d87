//! Fake password hasher: reversible on purpose, never use outside tests.

use userhub_core::error::DomainError;
use userhub_core::hasher::PasswordHasher;

/// Stores `hashed:<password>`; fast and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        Ok(format!("hashed:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        Ok(hash.strip_prefix("hashed:") == Some(password))
    }
}
