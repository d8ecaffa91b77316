//! Port the ledger uses to check that a referenced user exists.

use async_trait::async_trait;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised while asking the identity provider about a user.
    pub enum IdentityProviderError {
        /// The provider could not be reached.
        Unavailable { message: String } =>
            "identity provider unavailable: {message}",
    }
}

/// Answers `UserExists(userID)` for the rental ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return whether a user with `user_id` is registered.
    async fn user_exists(&self, user_id: &UserId) -> Result<bool, IdentityProviderError>;
}
