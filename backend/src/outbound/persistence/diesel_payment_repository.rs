//! PostgreSQL-backed `PaymentRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PaymentRepository, PaymentRepositoryError};
use crate::domain::{Amount, CardLastFour, Payment, PaymentId, RentalId, UserId};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::PaymentRow;
use super::pool::{DbPool, PoolError};
use super::schema::payments;

#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PaymentRepositoryError {
    map_basic_pool_error(error, PaymentRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PaymentRepositoryError {
    map_basic_diesel_error(
        error,
        PaymentRepositoryError::query,
        PaymentRepositoryError::connection,
    )
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: *payment.id.as_uuid(),
        rental_id: *payment.rental_id.as_uuid(),
        user_id: *payment.user_id.as_uuid(),
        amount: payment.amount.minor_units(),
        card_last_four: payment.card_last_four.as_ref().to_owned(),
        status: payment.status.as_str().to_owned(),
        paid_at: payment.paid_at,
    }
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, PaymentRepositoryError> {
    let invalid =
        |err: &dyn std::fmt::Display| PaymentRepositoryError::query(format!("stored payment {} is invalid: {err}", row.id));
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        rental_id: RentalId::from_uuid(row.rental_id),
        user_id: UserId::from_uuid(row.user_id),
        amount: Amount::new(row.amount).map_err(|err| invalid(&err))?,
        card_last_four: CardLastFour::new(row.card_last_four.clone())
            .map_err(|err| invalid(&err))?,
        status: row.status.parse().map_err(|err| invalid(&err))?,
        paid_at: row.paid_at,
    })
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(payments::table)
            .values(&payment_to_row(payment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Vec<Payment>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::rental_id.eq(rental_id.as_uuid()))
            .order(payments::paid_at.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_payment).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn row(amount: i64, suffix: &str) -> PaymentRow {
        PaymentRow {
            id: Uuid::new_v4(),
            rental_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount,
            card_last_four: suffix.to_owned(),
            status: "completed".to_owned(),
            paid_at: Utc::now(),
        }
    }

    #[rstest]
    fn valid_rows_convert() {
        let payment = row_to_payment(row(900, "4242")).expect("valid row");
        assert_eq!(payment.amount.minor_units(), 900);
        assert_eq!(payment.card_last_four.as_ref(), "4242");
    }

    #[rstest]
    #[case(0, "4242")]
    #[case(900, "42")]
    fn invalid_rows_are_query_errors(#[case] amount: i64, #[case] suffix: &str) {
        let error = row_to_payment(row(amount, suffix)).expect_err("invalid row");
        assert!(matches!(error, PaymentRepositoryError::Query { .. }));
    }
}
