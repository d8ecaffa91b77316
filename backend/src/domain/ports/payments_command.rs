//! Driving port for rental payments.

use async_trait::async_trait;

use crate::domain::{Error, Payment, PaymentRequest, RentalId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentsCommand: Send + Sync {
    /// Record a payment against a rental owned by the payer.
    ///
    /// # Errors
    ///
    /// Returns `not_found` when the rental does not exist and `forbidden`
    /// when it belongs to another user.
    async fn pay(&self, request: PaymentRequest) -> Result<Payment, Error>;

    /// Payments recorded against a rental.
    async fn payments_for_rental(&self, rental_id: RentalId) -> Result<Vec<Payment>, Error>;
}
