//! Rental ledger domain service.
//!
//! Implements the [`RentalLedger`] driving port on top of a
//! [`RentalLedgerRepository`] and an [`IdentityProvider`]. Atomicity of the
//! status flip and the rental insert lives in the repository; this service
//! owns identity checks, timestamps, bounded retry, and the return policy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    IdentityProvider, LedgerRepositoryError, RentalLedger, RentalLedgerRepository,
};
use crate::domain::{
    Bicycle, BicycleId, BicycleListing, Gear, LedgerError, Location, Rental, RetryError,
    RetryPolicy, RetrySleeper, ReturnPolicy, TokioSleeper, UserId, at_storage_precision,
    with_retry,
};

/// Rental ledger service implementing the [`RentalLedger`] driving port.
#[derive(Clone)]
pub struct RentalLedgerService<R, I> {
    repo: Arc<R>,
    identity: Arc<I>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    sleeper: Arc<dyn RetrySleeper>,
    return_policy: ReturnPolicy,
}

impl<R, I> RentalLedgerService<R, I> {
    /// Create a service with the default retry and return policies.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use rental_ledger::domain::RentalLedgerService;
    /// # use rental_ledger::test_support::InMemoryLedgerStore;
    /// let store = Arc::new(InMemoryLedgerStore::default());
    /// let service = RentalLedgerService::new(store.clone(), store, Arc::new(DefaultClock));
    /// ```
    pub fn new(repo: Arc<R>, identity: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            identity,
            clock,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            return_policy: ReturnPolicy::default(),
        }
    }

    /// Replace the retry policy for storage calls.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the pause used between retries.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn RetrySleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Choose who may return a rented bicycle.
    #[must_use]
    pub fn with_return_policy(mut self, return_policy: ReturnPolicy) -> Self {
        self.return_policy = return_policy;
        self
    }
}

impl<R, I> RentalLedgerService<R, I>
where
    R: RentalLedgerRepository,
    I: IdentityProvider,
{
    async fn ensure_user(&self, user_id: &UserId) -> Result<(), LedgerError> {
        let exists = self.identity.user_exists(user_id).await.map_err(|err| {
            LedgerError::IdentityUnavailable {
                message: err.to_string(),
            }
        })?;
        if exists {
            Ok(())
        } else {
            Err(LedgerError::UnknownUser {
                user_id: user_id.clone(),
            })
        }
    }

    fn map_repo_error(
        error: RetryError<LedgerRepositoryError>,
        bicycle_id: Option<BicycleId>,
    ) -> LedgerError {
        let error = match error {
            RetryError::Exhausted { attempts, last } => {
                return LedgerError::StorageTransient {
                    attempts,
                    message: last.to_string(),
                };
            }
            RetryError::Permanent(error) => error,
        };
        match (error, bicycle_id) {
            (LedgerRepositoryError::NotAvailable { .. }, Some(bicycle_id)) => {
                LedgerError::NotAvailable { bicycle_id }
            }
            (LedgerRepositoryError::NoOpenRental { .. }, Some(bicycle_id)) => {
                LedgerError::NoOpenRental { bicycle_id }
            }
            (LedgerRepositoryError::UnknownUser { user_id }, _) => match UserId::new(&user_id) {
                Ok(user_id) => LedgerError::UnknownUser { user_id },
                Err(_) => LedgerError::StorageFatal {
                    message: format!("storage reported malformed user id {user_id}"),
                },
            },
            (other, _) => LedgerError::StorageFatal {
                message: other.to_string(),
            },
        }
    }

    async fn retrying<T, F, Fut>(&self, operation: F) -> Result<T, RetryError<LedgerRepositoryError>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, LedgerRepositoryError>>,
    {
        with_retry(
            &self.retry,
            self.sleeper.as_ref(),
            LedgerRepositoryError::is_transient,
            operation,
        )
        .await
    }

    /// True when `rental` is in the store.
    ///
    /// A transient failure can arrive after the commit, in which case the
    /// retry is rejected by the write it is repeating.
    async fn rental_was_stored(&self, rental: &Rental) -> bool {
        matches!(self.repo.find_rental(rental.id()).await, Ok(Some(_)))
    }

    /// Newest rental on `bicycle_id` matching `renter` if it was closed at or
    /// after `since`.
    async fn rental_closed_since(
        &self,
        bicycle_id: BicycleId,
        renter: Option<&UserId>,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Option<Rental> {
        let rentals = self.repo.rentals_for_bicycle(bicycle_id).await.ok()?;
        rentals
            .into_iter()
            .find(|rental| renter.is_none_or(|renter| rental.user_id() == renter))
            .filter(|rental| rental.ended_at().is_some_and(|ended| ended >= since))
    }
}

fn note_transient<T>(
    result: Result<T, LedgerRepositoryError>,
    seen: &AtomicBool,
) -> Result<T, LedgerRepositoryError> {
    if result.as_ref().is_err_and(LedgerRepositoryError::is_transient) {
        seen.store(true, Ordering::Relaxed);
    }
    result
}

#[async_trait]
impl<R, I> RentalLedger for RentalLedgerService<R, I>
where
    R: RentalLedgerRepository,
    I: IdentityProvider,
{
    async fn rent_bicycle(
        &self,
        user_id: &UserId,
        bicycle_id: BicycleId,
    ) -> Result<Rental, LedgerError> {
        self.ensure_user(user_id).await?;

        let rental = Rental::open(user_id.clone(), bicycle_id, self.clock.utc());
        let repo = self.repo.as_ref();
        let pending = &rental;
        let retried = AtomicBool::new(false);
        let seen = &retried;
        let outcome = self
            .retrying(|| async move { note_transient(repo.open_rental(pending).await, seen) })
            .await;
        if let Err(err) = outcome {
            let rejected = matches!(
                err,
                RetryError::Permanent(LedgerRepositoryError::NotAvailable { .. })
            );
            if !(rejected && retried.load(Ordering::Relaxed) && self.rental_was_stored(&rental).await)
            {
                return Err(Self::map_repo_error(err, Some(bicycle_id)));
            }
            warn!(
                rental_id = %rental.id(),
                "rental committed before a transient failure was reported"
            );
        }

        info!(
            rental_id = %rental.id(),
            user_id = %user_id,
            bicycle_id = %bicycle_id,
            "rental opened"
        );
        Ok(rental)
    }

    async fn return_bicycle(
        &self,
        user_id: &UserId,
        bicycle_id: BicycleId,
    ) -> Result<Rental, LedgerError> {
        let renter = self.return_policy.renter_filter(user_id).cloned();
        let requested_at = at_storage_precision(self.clock.utc());
        let repo = self.repo.as_ref();
        let clock = self.clock.as_ref();
        let filter = &renter;
        let retried = AtomicBool::new(false);
        let seen = &retried;
        let outcome = self
            .retrying(|| async move {
                let result = repo
                    .close_rental(bicycle_id, filter.clone(), clock.utc())
                    .await;
                note_transient(result, seen)
            })
            .await;
        let rental = match outcome {
            Ok(rental) => rental,
            Err(err) => {
                let rejected = matches!(
                    err,
                    RetryError::Permanent(LedgerRepositoryError::NoOpenRental { .. })
                );
                let recovered = if rejected && retried.load(Ordering::Relaxed) {
                    self.rental_closed_since(bicycle_id, renter.as_ref(), requested_at)
                        .await
                } else {
                    None
                };
                let Some(rental) = recovered else {
                    return Err(Self::map_repo_error(err, Some(bicycle_id)));
                };
                warn!(
                    rental_id = %rental.id(),
                    "rental closed before a transient failure was reported"
                );
                rental
            }
        };

        if rental.user_id() != user_id {
            warn!(
                rental_id = %rental.id(),
                renter = %rental.user_id(),
                returned_by = %user_id,
                "bicycle returned by a different user"
            );
        }
        info!(
            rental_id = %rental.id(),
            bicycle_id = %bicycle_id,
            "rental closed"
        );
        Ok(rental)
    }

    async fn list_available(&self) -> Result<Vec<BicycleListing>, LedgerError> {
        let repo = self.repo.as_ref();
        self.retrying(|| async move { repo.list_available().await })
            .await
            .map_err(|err| Self::map_repo_error(err, None))
    }

    async fn list_bicycle(&self, bicycle_id: BicycleId) -> Result<Bicycle, LedgerError> {
        let repo = self.repo.as_ref();
        self.retrying(|| async move { repo.find_bicycle(bicycle_id).await })
            .await
            .map_err(|err| Self::map_repo_error(err, Some(bicycle_id)))?
            .ok_or(LedgerError::UnknownBicycle { bicycle_id })
    }

    async fn add_bicycle(
        &self,
        owner: &UserId,
        location: Location,
        gear: Gear,
    ) -> Result<Bicycle, LedgerError> {
        self.ensure_user(owner).await?;

        let bicycle = Bicycle::listed(owner.clone(), location, gear);
        let repo = self.repo.as_ref();
        let pending = &bicycle;
        self.retrying(|| async move { repo.insert_bicycle(pending).await })
            .await
            .map_err(|err| Self::map_repo_error(err, Some(bicycle.id())))?;

        info!(bicycle_id = %bicycle.id(), owner = %owner, "bicycle listed");
        Ok(bicycle)
    }
}

#[cfg(test)]
#[path = "rental_ledger_service_tests.rs"]
mod tests;
