//! Port for rental feedback.

use async_trait::async_trait;

use crate::domain::{Feedback, RentalId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by feedback repository adapters.
    pub enum FeedbackRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "feedback repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "feedback repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Persist a feedback entry.
    async fn insert(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError>;

    /// Feedback left for a rental, oldest first.
    async fn list_for_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Vec<Feedback>, FeedbackRepositoryError>;
}
