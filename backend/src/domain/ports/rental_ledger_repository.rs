//! Port for the storage side of the rental ledger.
//!
//! The store is the only synchronisation point for bicycle status. Each
//! write method is a single atomic unit: either every row it touches changes
//! or none do.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Bicycle, BicycleId, BicycleListing, Rental, RentalId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rental ledger storage adapters.
    pub enum LedgerRepositoryError {
        /// The conditional status update found no available bicycle.
        NotAvailable { bicycle_id: String } =>
            "bicycle {bicycle_id} is not available",
        /// No open rental matched the return request.
        NoOpenRental { bicycle_id: String } =>
            "no open rental for bicycle {bicycle_id}",
        /// A referenced user row does not exist.
        UnknownUser { user_id: String } =>
            "user {user_id} does not exist",
        /// Contention or connectivity failure that may succeed on retry.
        Busy { message: String } =>
            "ledger storage busy: {message}",
        /// Non-retryable storage failure.
        Query { message: String } =>
            "ledger storage query failed: {message}",
    }
}

impl LedgerRepositoryError {
    /// True for failures that a bounded retry may resolve.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Storage operations backing the rental ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalLedgerRepository: Send + Sync {
    /// Flip `rental.bicycle_id()` from available to rented and insert
    /// `rental`, atomically.
    ///
    /// The status change is a conditional update. When it matches no row the
    /// adapter returns [`LedgerRepositoryError::NotAvailable`] and inserts
    /// nothing.
    async fn open_rental(&self, rental: &Rental) -> Result<(), LedgerRepositoryError>;

    /// Close the most recently opened open rental for `bicycle_id` and flip
    /// the bicycle back to available, atomically.
    ///
    /// When `renter` is set, only rentals opened by that user match.
    async fn close_rental(
        &self,
        bicycle_id: BicycleId,
        renter: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Rental, LedgerRepositoryError>;

    /// Persist a newly listed bicycle.
    async fn insert_bicycle(&self, bicycle: &Bicycle) -> Result<(), LedgerRepositoryError>;

    /// Fetch a bicycle in any status.
    async fn find_bicycle(
        &self,
        bicycle_id: BicycleId,
    ) -> Result<Option<Bicycle>, LedgerRepositoryError>;

    /// Snapshot of every available bicycle with its owner's name.
    async fn list_available(&self) -> Result<Vec<BicycleListing>, LedgerRepositoryError>;

    /// Fetch a rental by identifier.
    async fn find_rental(&self, rental_id: RentalId)
    -> Result<Option<Rental>, LedgerRepositoryError>;

    /// Every rental recorded for a bicycle, newest first.
    async fn rentals_for_bicycle(
        &self,
        bicycle_id: BicycleId,
    ) -> Result<Vec<Rental>, LedgerRepositoryError>;
}
