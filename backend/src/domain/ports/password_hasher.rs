//! Port for salted password hashing.

use async_trait::async_trait;

use crate::domain::{Password, PasswordHash};

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing or verification could not be performed.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Hashes new passwords and verifies login attempts.
///
/// Implementations are expected to be CPU heavy and must not block the
/// async executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted hash for `password`.
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError>;

    /// Check `password` against a stored hash.
    async fn verify(
        &self,
        password: &Password,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashError>;
}
