//! Driving port for the rental ledger.
//!
//! HTTP handlers call [`RentalLedger`] to rent and return bicycles and to
//! browse the catalogue. The service behind it owns the retry policy and the
//! return matching policy, so adapters never see storage contention directly.

use async_trait::async_trait;

use crate::domain::{
    Bicycle, BicycleId, BicycleListing, Gear, LedgerError, Location, Rental, UserId,
};

/// Driving port for rental operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalLedger: Send + Sync {
    /// Open a rental for `user_id` on `bicycle_id`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownUser`] when the identity service does not know
    ///   the user. No storage write happens in that case.
    /// - [`LedgerError::NotAvailable`] when the bicycle is rented or absent.
    /// - [`LedgerError::StorageTransient`] once retries are exhausted.
    async fn rent_bicycle(
        &self,
        user_id: &UserId,
        bicycle_id: BicycleId,
    ) -> Result<Rental, LedgerError>;

    /// Close the open rental on `bicycle_id`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoOpenRental`] when nothing matches.
    /// - [`LedgerError::StorageTransient`] once retries are exhausted.
    async fn return_bicycle(
        &self,
        user_id: &UserId,
        bicycle_id: BicycleId,
    ) -> Result<Rental, LedgerError>;

    /// Available bicycles with owner names.
    async fn list_available(&self) -> Result<Vec<BicycleListing>, LedgerError>;

    /// A single bicycle in any status.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownBicycle`] when the id is not listed.
    async fn list_bicycle(&self, bicycle_id: BicycleId) -> Result<Bicycle, LedgerError>;

    /// List a new bicycle owned by `owner`.
    async fn add_bicycle(
        &self,
        owner: &UserId,
        location: Location,
        gear: Gear,
    ) -> Result<Bicycle, LedgerError>;
}
