//! bcrypt-backed `PasswordHasher`.
//!
//! bcrypt is CPU bound, so both operations run on the blocking pool with the
//! caller's trace id carried across.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{Password, PasswordHash, TraceId};

/// Salted bcrypt hashing with a configurable cost.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl BcryptPasswordHasher {
    /// Build a hasher using `cost` rounds.
    ///
    /// # Errors
    ///
    /// Returns an error when `cost` lies outside bcrypt's 4..=31 range.
    pub fn with_cost(cost: u32) -> Result<Self, PasswordHashError> {
        if !(4..=31).contains(&cost) {
            return Err(PasswordHashError::hashing(format!(
                "bcrypt cost must be between 4 and 31, got {cost}"
            )));
        }
        Ok(Self { cost })
    }
}

fn join_error(err: tokio::task::JoinError) -> PasswordHashError {
    PasswordHashError::hashing(format!("hashing task failed: {err}"))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError> {
        let plaintext = Zeroizing::new(password.expose().to_owned());
        let cost = self.cost;
        TraceId::in_blocking(move || bcrypt::hash(plaintext.as_str(), cost))
            .await
            .map_err(join_error)?
            .map(PasswordHash::new)
            .map_err(|err| PasswordHashError::hashing(err.to_string()))
    }

    async fn verify(
        &self,
        password: &Password,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashError> {
        let plaintext = Zeroizing::new(password.expose().to_owned());
        let stored = hash.as_str().to_owned();
        match TraceId::in_blocking(move || bcrypt::verify(plaintext.as_str(), &stored))
            .await
            .map_err(join_error)?
        {
            Ok(matches) => Ok(matches),
            // A malformed stored hash can never match.
            Err(bcrypt::BcryptError::InvalidHash(_) | bcrypt::BcryptError::InvalidPrefix(_)) => {
                Ok(false)
            }
            Err(err) => Err(PasswordHashError::hashing(err.to_string())),
        }
    }
}
