//! Driving port for rental feedback.

use async_trait::async_trait;

use crate::domain::{Error, Feedback, FeedbackRequest, RentalId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackCommand: Send + Sync {
    /// Leave feedback on a closed rental.
    ///
    /// # Errors
    ///
    /// Returns `not_found` for an unknown rental, `forbidden` when the rental
    /// belongs to another user, and `conflict` while it is still open.
    async fn submit(&self, request: FeedbackRequest) -> Result<Feedback, Error>;

    /// Feedback left for a rental.
    async fn feedback_for_rental(&self, rental_id: RentalId) -> Result<Vec<Feedback>, Error>;
}
