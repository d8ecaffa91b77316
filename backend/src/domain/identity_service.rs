//! Identity domain service: registration, login, and user lookup.
//!
//! Implements both [`IdentityCommand`] for inbound adapters and
//! [`IdentityProvider`] for the rental ledger.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    IdentityCommand, IdentityProvider, IdentityProviderError, PasswordHashError, PasswordHasher,
    UserPersistenceError, UserRepository,
};
use crate::domain::{Error, LoginCredentials, Registration, User, UserId};

/// Identity service backed by a user repository and a password hasher.
#[derive(Clone)]
pub struct IdentityService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<U, H> IdentityService<U, H> {
    pub fn new(users: Arc<U>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => Error::invalid_request(
            "email is already registered",
        )
        .with_details(json!({ "field": "emailID", "code": "email_taken" })),
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

#[async_trait]
impl<U, H> IdentityCommand for IdentityService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        let today = self.clock.utc().date_naive();
        if registration.date_of_birth > today {
            return Err(Error::invalid_request("date of birth must not be in the future")
                .with_details(json!({ "field": "DOB", "code": "future_date" })));
        }

        let hash = self
            .hasher
            .hash(&registration.password)
            .await
            .map_err(map_hash_error)?;
        let user = User::new(
            UserId::random(),
            registration.display_name,
            registration.email,
            registration.phone,
            registration.date_of_birth,
        );
        self.users
            .insert(&user, &hash)
            .await
            .map_err(map_user_error)?;

        info!(user_id = %user.id(), "user registered");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            return Err(Error::unauthorized("invalid credentials"));
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .await
            .map_err(map_hash_error)?;
        if matches {
            Ok(stored.user_id)
        } else {
            Err(Error::unauthorized("invalid credentials"))
        }
    }
}

#[async_trait]
impl<U, H> IdentityProvider for IdentityService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn user_exists(&self, user_id: &UserId) -> Result<bool, IdentityProviderError> {
        self.users
            .exists(user_id)
            .await
            .map_err(|err| IdentityProviderError::unavailable(err.to_string()))
    }
}
