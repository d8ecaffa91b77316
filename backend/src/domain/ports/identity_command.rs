//! Driving port for account registration and login.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, Registration, User, UserId};

/// Account use-cases exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityCommand: Send + Sync {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` when the email is taken or the date of birth
    /// lies in the future.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Validate credentials and return the account id.
    ///
    /// # Errors
    ///
    /// Returns `unauthorized` for an unknown email or a wrong password. The
    /// two cases are indistinguishable to the caller.
    async fn login(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}
