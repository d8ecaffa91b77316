//! Payment and feedback services.
//!
//! Both attach records to an existing rental and only accept input from the
//! user who made that rental. Feedback additionally requires the rental to be
//! closed.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    FeedbackCommand, FeedbackRepository, FeedbackRepositoryError, LedgerRepositoryError,
    PaymentRepository, PaymentRepositoryError, PaymentsCommand, RentalLedgerRepository,
};
use crate::domain::{
    Error, Feedback, FeedbackId, FeedbackRequest, Payment, PaymentId, PaymentRequest,
    PaymentStatus, Rental, RentalId, UserId, at_storage_precision,
};

fn map_ledger_error(error: LedgerRepositoryError) -> Error {
    if error.is_transient() {
        Error::service_unavailable(format!("ledger storage unavailable: {error}"))
    } else {
        Error::internal(format!("ledger storage error: {error}"))
    }
}

async fn rental_or_not_found<L>(ledger: &L, rental_id: RentalId) -> Result<Rental, Error>
where
    L: RentalLedgerRepository + ?Sized,
{
    ledger
        .find_rental(rental_id)
        .await
        .map_err(map_ledger_error)?
        .ok_or_else(|| {
            Error::not_found(format!("rental {rental_id} not found"))
                .with_details(json!({ "rentalId": rental_id.to_string() }))
        })
}

fn ensure_owner(rental: &Rental, user_id: &UserId) -> Result<(), Error> {
    if rental.user_id() == user_id {
        Ok(())
    } else {
        Err(Error::forbidden("rental belongs to another user"))
    }
}

/// Records payments against rentals.
#[derive(Clone)]
pub struct PaymentService<L, P> {
    ledger: Arc<L>,
    payments: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<L, P> PaymentService<L, P> {
    pub fn new(ledger: Arc<L>, payments: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            payments,
            clock,
        }
    }
}

fn map_payment_error(error: PaymentRepositoryError) -> Error {
    match error {
        PaymentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("payment repository unavailable: {message}"))
        }
        PaymentRepositoryError::Query { message } => {
            Error::internal(format!("payment repository error: {message}"))
        }
    }
}

#[async_trait]
impl<L, P> PaymentsCommand for PaymentService<L, P>
where
    L: RentalLedgerRepository,
    P: PaymentRepository,
{
    async fn pay(&self, request: PaymentRequest) -> Result<Payment, Error> {
        let rental = rental_or_not_found(self.ledger.as_ref(), request.rental_id).await?;
        ensure_owner(&rental, &request.user_id)?;

        let payment = Payment {
            id: PaymentId::random(),
            rental_id: request.rental_id,
            user_id: request.user_id,
            amount: request.amount,
            card_last_four: request.card.last_four(),
            status: PaymentStatus::Completed,
            paid_at: at_storage_precision(self.clock.utc()),
        };
        self.payments
            .insert(&payment)
            .await
            .map_err(map_payment_error)?;

        info!(
            payment_id = %payment.id,
            rental_id = %payment.rental_id,
            amount = payment.amount.minor_units(),
            "payment recorded"
        );
        Ok(payment)
    }

    async fn payments_for_rental(&self, rental_id: RentalId) -> Result<Vec<Payment>, Error> {
        rental_or_not_found(self.ledger.as_ref(), rental_id).await?;
        self.payments
            .list_for_rental(rental_id)
            .await
            .map_err(map_payment_error)
    }
}

/// Accepts feedback on returned rentals.
#[derive(Clone)]
pub struct FeedbackService<L, F> {
    ledger: Arc<L>,
    feedback: Arc<F>,
    clock: Arc<dyn Clock>,
}

impl<L, F> FeedbackService<L, F> {
    pub fn new(ledger: Arc<L>, feedback: Arc<F>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            feedback,
            clock,
        }
    }
}

fn map_feedback_error(error: FeedbackRepositoryError) -> Error {
    match error {
        FeedbackRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("feedback repository unavailable: {message}"))
        }
        FeedbackRepositoryError::Query { message } => {
            Error::internal(format!("feedback repository error: {message}"))
        }
    }
}

#[async_trait]
impl<L, F> FeedbackCommand for FeedbackService<L, F>
where
    L: RentalLedgerRepository,
    F: FeedbackRepository,
{
    async fn submit(&self, request: FeedbackRequest) -> Result<Feedback, Error> {
        let rental = rental_or_not_found(self.ledger.as_ref(), request.rental_id).await?;
        ensure_owner(&rental, &request.user_id)?;
        if rental.is_open() {
            return Err(Error::conflict("rental is still open")
                .with_details(json!({ "code": "rental_still_open" })));
        }

        let feedback = Feedback {
            id: FeedbackId::random(),
            rental_id: request.rental_id,
            user_id: request.user_id,
            text: request.text,
            rating: request.rating,
            submitted_at: at_storage_precision(self.clock.utc()),
        };
        self.feedback
            .insert(&feedback)
            .await
            .map_err(map_feedback_error)?;

        info!(rental_id = %feedback.rental_id, rating = feedback.rating.value(), "feedback recorded");
        Ok(feedback)
    }

    async fn feedback_for_rental(&self, rental_id: RentalId) -> Result<Vec<Feedback>, Error> {
        rental_or_not_found(self.ledger.as_ref(), rental_id).await?;
        self.feedback
            .list_for_rental(rental_id)
            .await
            .map_err(map_feedback_error)
    }
}
