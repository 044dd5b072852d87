//! One-way password hashing capability.

use crate::error::DomainError;

/// Hashes and verifies passwords. Implementations must be irreversible and
/// salted, so that the stored value never equals the plaintext.
pub trait PasswordHasher: Send + Sync {
    /// Produces a storable hash of `password`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if hashing fails.
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Checks `password` against a hash produced by [`PasswordHasher::hash`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if `hash` cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError>;
}
