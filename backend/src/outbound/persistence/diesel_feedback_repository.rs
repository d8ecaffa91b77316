//! PostgreSQL-backed `FeedbackRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{FeedbackRepository, FeedbackRepositoryError};
use crate::domain::{Feedback, FeedbackId, FeedbackText, Rating, RentalId, UserId};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::FeedbackRow;
use super::pool::{DbPool, PoolError};
use super::schema::feedback;

#[derive(Clone)]
pub struct DieselFeedbackRepository {
    pool: DbPool,
}

impl DieselFeedbackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FeedbackRepositoryError {
    map_basic_pool_error(error, FeedbackRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> FeedbackRepositoryError {
    map_basic_diesel_error(
        error,
        FeedbackRepositoryError::query,
        FeedbackRepositoryError::connection,
    )
}

fn row_to_feedback(row: FeedbackRow) -> Result<Feedback, FeedbackRepositoryError> {
    let id = row.id;
    let invalid = |err: &dyn std::fmt::Display| {
        FeedbackRepositoryError::query(format!("stored feedback {id} is invalid: {err}"))
    };
    Ok(Feedback {
        id: FeedbackId::from_uuid(row.id),
        rental_id: RentalId::from_uuid(row.rental_id),
        user_id: UserId::from_uuid(row.user_id),
        text: FeedbackText::new(row.body).map_err(|err| invalid(&err))?,
        rating: Rating::new(row.rating).map_err(|err| invalid(&err))?,
        submitted_at: row.submitted_at,
    })
}

#[async_trait]
impl FeedbackRepository for DieselFeedbackRepository {
    async fn insert(&self, entry: &Feedback) -> Result<(), FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = FeedbackRow {
            id: *entry.id.as_uuid(),
            rental_id: *entry.rental_id.as_uuid(),
            user_id: *entry.user_id.as_uuid(),
            body: entry.text.as_ref().to_owned(),
            rating: entry.rating.value(),
            submitted_at: entry.submitted_at,
        };
        diesel::insert_into(feedback::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Vec<Feedback>, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<FeedbackRow> = feedback::table
            .filter(feedback::rental_id.eq(rental_id.as_uuid()))
            .order(feedback::submitted_at.asc())
            .select(FeedbackRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_feedback).collect()
    }
}
