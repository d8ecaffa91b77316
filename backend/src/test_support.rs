//! Test utilities shared by unit tests and the `tests/` suites.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature, which the
//! crate's dev-dependency on itself enables.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::domain::ports::{
    FeedbackRepository, FeedbackRepositoryError, IdentityProvider, IdentityProviderError,
    LedgerRepositoryError, PaymentRepository, PaymentRepositoryError, RentalLedgerRepository,
    StoredCredentials, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Bicycle, BicycleId, BicycleListing, BicycleStatus, DisplayName, EmailAddress, Feedback,
    PasswordHash, Payment, Rental, RentalId, User, UserId,
};

#[derive(Default)]
struct LedgerState {
    users: HashMap<UserId, Option<DisplayName>>,
    credentials: HashMap<EmailAddress, StoredCredentials>,
    bicycles: HashMap<BicycleId, Bicycle>,
    listing_order: Vec<BicycleId>,
    rentals: Vec<Rental>,
    payments: Vec<Payment>,
    feedback: Vec<Feedback>,
    pending_busy_failures: u32,
    pending_lost_acks: u32,
}

/// In-memory store backing every outbound port.
///
/// A single mutex guards all state, so every repository call is atomic in
/// the same way a database transaction is. It implements the ledger, user,
/// payment and feedback repositories plus the identity provider, so one
/// instance can stand in for the whole persistence layer.
///
/// # Examples
///
/// ```
/// use rental_ledger::domain::UserId;
/// use rental_ledger::test_support::InMemoryLedgerStore;
///
/// let store = InMemoryLedgerStore::default();
/// let rider = UserId::random();
/// store.add_user(rider.clone(), None);
/// assert_eq!(store.open_rental_count(), 0);
/// ```
#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl InMemoryLedgerStore {
    fn with_state<T>(&self, f: impl FnOnce(&mut LedgerState) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    /// Register a user, optionally with a display name.
    pub fn add_user(&self, user_id: UserId, name: Option<DisplayName>) {
        self.with_state(|state| {
            state.users.insert(user_id, name);
        });
    }

    /// Store a bicycle directly, bypassing owner checks.
    pub fn add_bicycle(&self, bicycle: Bicycle) {
        self.with_state(|state| {
            state.listing_order.push(bicycle.id());
            state.bicycles.insert(bicycle.id(), bicycle);
        });
    }

    /// Make the next `count` write calls fail with a retryable error.
    pub fn fail_next_writes(&self, count: u32) {
        self.with_state(|state| state.pending_busy_failures = count);
    }

    /// Apply the next `count` rent or return writes, then report them as a
    /// dropped connection.
    pub fn drop_next_acknowledgements(&self, count: u32) {
        self.with_state(|state| state.pending_lost_acks = count);
    }

    /// Current status of a bicycle.
    pub fn status_of(&self, bicycle_id: BicycleId) -> Option<BicycleStatus> {
        self.with_state(|state| state.bicycles.get(&bicycle_id).map(Bicycle::status))
    }

    /// Every rental recorded so far, in insertion order.
    pub fn rentals(&self) -> Vec<Rental> {
        self.with_state(|state| state.rentals.clone())
    }

    /// Number of rentals without an end time.
    pub fn open_rental_count(&self) -> usize {
        self.with_state(|state| state.rentals.iter().filter(|r| r.is_open()).count())
    }
}

fn take_busy_failure(state: &mut LedgerState) -> Result<(), LedgerRepositoryError> {
    if state.pending_busy_failures > 0 {
        state.pending_busy_failures -= 1;
        return Err(LedgerRepositoryError::busy("injected contention"));
    }
    Ok(())
}

fn take_lost_ack(state: &mut LedgerState) -> Result<(), LedgerRepositoryError> {
    if state.pending_lost_acks > 0 {
        state.pending_lost_acks -= 1;
        return Err(LedgerRepositoryError::busy("server closed the connection"));
    }
    Ok(())
}

fn set_status(state: &mut LedgerState, bicycle_id: BicycleId, status: BicycleStatus) {
    if let Some(bicycle) = state.bicycles.get_mut(&bicycle_id) {
        *bicycle = Bicycle::new(
            bicycle.id(),
            status,
            bicycle.location().clone(),
            bicycle.gear().clone(),
            bicycle.owner().cloned(),
        );
    }
}

#[async_trait]
impl RentalLedgerRepository for InMemoryLedgerStore {
    async fn open_rental(&self, rental: &Rental) -> Result<(), LedgerRepositoryError> {
        self.with_state(|state| {
            take_busy_failure(state)?;
            let bicycle_id = rental.bicycle_id();
            let available = state
                .bicycles
                .get(&bicycle_id)
                .is_some_and(|b| b.status() == BicycleStatus::Available);
            if !available {
                return Err(LedgerRepositoryError::not_available(bicycle_id.to_string()));
            }
            if !state.users.contains_key(rental.user_id()) {
                return Err(LedgerRepositoryError::unknown_user(rental.user_id().to_string()));
            }
            set_status(state, bicycle_id, BicycleStatus::Rented);
            state.rentals.push(rental.clone());
            take_lost_ack(state)
        })
    }

    async fn close_rental(
        &self,
        bicycle_id: BicycleId,
        renter: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Rental, LedgerRepositoryError> {
        self.with_state(|state| {
            take_busy_failure(state)?;
            let index = state
                .rentals
                .iter()
                .enumerate()
                .filter(|(_, r)| r.bicycle_id() == bicycle_id && r.is_open())
                .filter(|(_, r)| renter.as_ref().is_none_or(|u| r.user_id() == u))
                .max_by_key(|(_, r)| r.started_at())
                .map(|(index, _)| index)
                .ok_or_else(|| LedgerRepositoryError::no_open_rental(bicycle_id.to_string()))?;

            let closed = state.rentals[index].clone().closed_at(now);
            state.rentals[index] = closed.clone();
            set_status(state, bicycle_id, BicycleStatus::Available);
            take_lost_ack(state)?;
            Ok(closed)
        })
    }

    async fn insert_bicycle(&self, bicycle: &Bicycle) -> Result<(), LedgerRepositoryError> {
        self.with_state(|state| {
            take_busy_failure(state)?;
            if let Some(owner) = bicycle
                .owner()
                .filter(|owner| !state.users.contains_key(*owner))
            {
                return Err(LedgerRepositoryError::unknown_user(owner.to_string()));
            }
            state.listing_order.push(bicycle.id());
            state.bicycles.insert(bicycle.id(), bicycle.clone());
            Ok(())
        })
    }

    async fn find_bicycle(
        &self,
        bicycle_id: BicycleId,
    ) -> Result<Option<Bicycle>, LedgerRepositoryError> {
        Ok(self.with_state(|state| state.bicycles.get(&bicycle_id).cloned()))
    }

    async fn list_available(&self) -> Result<Vec<BicycleListing>, LedgerRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .listing_order
                .iter()
                .filter_map(|id| state.bicycles.get(id))
                .filter(|b| b.status() == BicycleStatus::Available)
                .map(|b| BicycleListing {
                    bicycle: b.clone(),
                    owner_name: b
                        .owner()
                        .and_then(|owner| state.users.get(owner).cloned().flatten()),
                })
                .collect()
        }))
    }

    async fn find_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Option<Rental>, LedgerRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .rentals
                .iter()
                .find(|r| r.id() == rental_id)
                .cloned()
        }))
    }

    async fn rentals_for_bicycle(
        &self,
        bicycle_id: BicycleId,
    ) -> Result<Vec<Rental>, LedgerRepositoryError> {
        Ok(self.with_state(|state| {
            let mut rentals: Vec<Rental> = state
                .rentals
                .iter()
                .filter(|r| r.bicycle_id() == bicycle_id)
                .cloned()
                .collect();
            rentals.sort_by_key(|r| std::cmp::Reverse(r.started_at()));
            rentals
        }))
    }
}

#[async_trait]
impl IdentityProvider for InMemoryLedgerStore {
    async fn user_exists(&self, user_id: &UserId) -> Result<bool, IdentityProviderError> {
        Ok(self.with_state(|state| state.users.contains_key(user_id)))
    }
}

#[async_trait]
impl UserRepository for InMemoryLedgerStore {
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        self.with_state(|state| {
            if state.credentials.contains_key(user.email()) {
                return Err(UserPersistenceError::duplicate_email(user.email().to_string()));
            }
            state.credentials.insert(
                user.email().clone(),
                StoredCredentials {
                    user_id: user.id().clone(),
                    password_hash: password_hash.clone(),
                },
            );
            state
                .users
                .insert(user.id().clone(), Some(user.display_name().clone()));
            Ok(())
        })
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        Ok(self.with_state(|state| state.credentials.get(email).cloned()))
    }

    async fn exists(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        Ok(self.with_state(|state| state.users.contains_key(id)))
    }
}

#[async_trait]
impl PaymentRepository for InMemoryLedgerStore {
    async fn insert(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        self.with_state(|state| state.payments.push(payment.clone()));
        Ok(())
    }

    async fn list_for_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Vec<Payment>, PaymentRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .payments
                .iter()
                .filter(|p| p.rental_id == rental_id)
                .cloned()
                .collect()
        }))
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryLedgerStore {
    async fn insert(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError> {
        self.with_state(|state| state.feedback.push(feedback.clone()));
        Ok(())
    }

    async fn list_for_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Vec<Feedback>, FeedbackRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .feedback
                .iter()
                .filter(|f| f.rental_id == rental_id)
                .cloned()
                .collect()
        }))
    }
}

/// Clock that tests can move forwards or backwards.
pub struct MutableClock {
    now: Mutex<DateTime<Utc>>,
}

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
