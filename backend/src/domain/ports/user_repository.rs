//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{EmailAddress, PasswordHash, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The email unique constraint rejected the insert.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

/// Account identifier and hash looked up during login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user_id: UserId,
    pub password_hash: PasswordHash,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user together with their password hash.
    async fn insert(&self, user: &User, password_hash: &PasswordHash)
    -> Result<(), UserPersistenceError>;

    /// Fetch login credentials by normalised email.
    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    /// Return whether a user with `id` exists.
    async fn exists(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}
