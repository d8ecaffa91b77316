//! Port for recorded payments.

use async_trait::async_trait;

use crate::domain::{Payment, RentalId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment repository adapters.
    pub enum PaymentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "payment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "payment repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persist a payment. Only the card suffix is stored.
    async fn insert(&self, payment: &Payment) -> Result<(), PaymentRepositoryError>;

    /// Payments recorded against a rental, oldest first.
    async fn list_for_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Vec<Payment>, PaymentRepositoryError>;
}
