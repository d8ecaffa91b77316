//! PostgreSQL-backed `RentalLedgerRepository`.
//!
//! Renting is a conditional `UPDATE ... WHERE status = 'available'` followed
//! by the rental insert, both inside one transaction. Only one of any number
//! of concurrent renters can match the update; the rest see zero rows and
//! roll back without writing. Returning locks the open rental row with
//! `SELECT ... FOR UPDATE` before closing it and releasing the bicycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{LedgerRepositoryError, RentalLedgerRepository};
use crate::domain::{
    Bicycle, BicycleId, BicycleListing, BicycleStatus, DisplayName, Gear, Location, Rental,
    RentalId, UserId,
};

use super::diesel_error_mapping::{database_error_kind, is_contention, log_diesel_error};
use super::models::{BicycleRow, NewBicycleRow, RentalRow};
use super::pool::{DbPool, PoolError};
use super::schema::{bicycles, rentals, users};

/// Diesel implementation of the rental ledger store.
#[derive(Clone)]
pub struct DieselRentalLedgerRepository {
    pool: DbPool,
}

impl DieselRentalLedgerRepository {
    /// # Examples
    ///
    /// ```rust,no_run
    /// use rental_ledger::outbound::persistence::{
    ///     DbPool, DieselRentalLedgerRepository, PoolConfig,
    /// };
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/ledger")).await?;
    /// let _repo = DieselRentalLedgerRepository::new(pool);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Outcomes that abort a ledger transaction.
#[derive(Debug)]
enum LedgerTxError {
    Diesel(DieselError),
    NotAvailable,
    NoOpenRental,
}

impl From<DieselError> for LedgerTxError {
    fn from(value: DieselError) -> Self {
        Self::Diesel(value)
    }
}

/// Pool exhaustion is load, not a fault, so it is retryable.
fn map_pool_error(error: PoolError) -> LedgerRepositoryError {
    match error {
        PoolError::Checkout { message } => LedgerRepositoryError::busy(message),
        PoolError::Build { message } => LedgerRepositoryError::query(message),
    }
}

fn map_diesel_error(error: DieselError) -> LedgerRepositoryError {
    log_diesel_error(&error);
    if is_contention(&error) {
        return LedgerRepositoryError::busy(error.to_string());
    }
    match error {
        DieselError::NotFound => LedgerRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => LedgerRepositoryError::query("database query error"),
        _ => LedgerRepositoryError::query("database error"),
    }
}

fn map_tx_error(
    error: LedgerTxError,
    bicycle_id: BicycleId,
    user_id: Option<&UserId>,
) -> LedgerRepositoryError {
    match error {
        LedgerTxError::NotAvailable => LedgerRepositoryError::not_available(bicycle_id.to_string()),
        LedgerTxError::NoOpenRental => {
            LedgerRepositoryError::no_open_rental(bicycle_id.to_string())
        }
        LedgerTxError::Diesel(error) => match (database_error_kind(&error), user_id) {
            (Some(DatabaseErrorKind::ForeignKeyViolation), Some(user_id)) => {
                LedgerRepositoryError::unknown_user(user_id.to_string())
            }
            // The open-rental partial index caught a second open rental.
            (Some(DatabaseErrorKind::UniqueViolation), _) => {
                LedgerRepositoryError::not_available(bicycle_id.to_string())
            }
            _ => map_diesel_error(error),
        },
    }
}

/// Bicycle inserts only reference the owner; a unique violation is a
/// duplicate id, not a rental conflict.
fn map_bicycle_insert_error(error: DieselError, owner: Option<&UserId>) -> LedgerRepositoryError {
    match (database_error_kind(&error), owner) {
        (Some(DatabaseErrorKind::ForeignKeyViolation), Some(owner)) => {
            log_diesel_error(&error);
            LedgerRepositoryError::unknown_user(owner.to_string())
        }
        (Some(DatabaseErrorKind::UniqueViolation), _) => {
            log_diesel_error(&error);
            LedgerRepositoryError::query("bicycle id already exists")
        }
        _ => map_diesel_error(error),
    }
}

fn corrupt(what: &str, id: Uuid, err: impl std::fmt::Display) -> LedgerRepositoryError {
    LedgerRepositoryError::query(format!("stored {what} {id} is invalid: {err}"))
}

fn row_to_bicycle(row: BicycleRow) -> Result<Bicycle, LedgerRepositoryError> {
    let status: BicycleStatus = row
        .status
        .parse()
        .map_err(|err| corrupt("bicycle", row.id, err))?;
    let location = Location::new(row.location).map_err(|err| corrupt("bicycle", row.id, err))?;
    let gear: Gear =
        serde_json::from_value(row.gear).map_err(|err| corrupt("bicycle", row.id, err))?;
    Ok(Bicycle::new(
        BicycleId::from_uuid(row.id),
        status,
        location,
        gear,
        row.owner_id.map(UserId::from_uuid),
    ))
}

fn row_to_rental(row: RentalRow) -> Rental {
    Rental::from_parts(
        RentalId::from_uuid(row.id),
        UserId::from_uuid(row.user_id),
        BicycleId::from_uuid(row.bicycle_id),
        row.started_at,
        row.ended_at,
    )
}

fn rental_to_row(rental: &Rental) -> RentalRow {
    RentalRow {
        id: *rental.id().as_uuid(),
        user_id: *rental.user_id().as_uuid(),
        bicycle_id: *rental.bicycle_id().as_uuid(),
        started_at: rental.started_at(),
        ended_at: rental.ended_at(),
    }
}

#[async_trait]
impl RentalLedgerRepository for DieselRentalLedgerRepository {
    async fn open_rental(&self, rental: &Rental) -> Result<(), LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let bicycle_uuid = *rental.bicycle_id().as_uuid();
        let row = rental_to_row(rental);

        conn.transaction::<_, LedgerTxError, _>(|conn| {
            async move {
                let updated = diesel::update(
                    bicycles::table
                        .filter(bicycles::id.eq(bicycle_uuid))
                        .filter(bicycles::status.eq(BicycleStatus::Available.as_str())),
                )
                .set(bicycles::status.eq(BicycleStatus::Rented.as_str()))
                .execute(conn)
                .await?;

                if updated == 0 {
                    return Err(LedgerTxError::NotAvailable);
                }

                diesel::insert_into(rentals::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, rental.bicycle_id(), Some(rental.user_id())))
    }

    async fn close_rental(
        &self,
        bicycle_id: BicycleId,
        renter: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Rental, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let bicycle_uuid = *bicycle_id.as_uuid();
        let renter_uuid = renter.as_ref().map(|id| *id.as_uuid());

        let closed = conn
            .transaction::<_, LedgerTxError, _>(|conn| {
                async move {
                    let open: Vec<RentalRow> = rentals::table
                        .filter(rentals::bicycle_id.eq(bicycle_uuid))
                        .filter(rentals::ended_at.is_null())
                        .order(rentals::started_at.desc())
                        .select(RentalRow::as_select())
                        .for_update()
                        .load(conn)
                        .await?;

                    let row = open
                        .into_iter()
                        .find(|row| renter_uuid.is_none_or(|renter| row.user_id == renter))
                        .ok_or(LedgerTxError::NoOpenRental)?;
                    let rental = row_to_rental(row).closed_at(now);

                    let updated = diesel::update(
                        rentals::table
                            .filter(rentals::id.eq(*rental.id().as_uuid()))
                            .filter(rentals::ended_at.is_null()),
                    )
                    .set(rentals::ended_at.eq(rental.ended_at()))
                    .execute(conn)
                    .await?;
                    if updated == 0 {
                        return Err(LedgerTxError::NoOpenRental);
                    }

                    diesel::update(bicycles::table.filter(bicycles::id.eq(bicycle_uuid)))
                        .set(bicycles::status.eq(BicycleStatus::Available.as_str()))
                        .execute(conn)
                        .await?;
                    Ok(rental)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_tx_error(err, bicycle_id, None))?;

        Ok(closed)
    }

    async fn insert_bicycle(&self, bicycle: &Bicycle) -> Result<(), LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let gear = serde_json::to_value(bicycle.gear())
            .map_err(|err| LedgerRepositoryError::query(format!("serialise gear: {err}")))?;
        let row = NewBicycleRow {
            id: *bicycle.id().as_uuid(),
            owner_id: bicycle.owner().map(|owner| *owner.as_uuid()),
            status: bicycle.status().as_str(),
            location: bicycle.location().as_ref(),
            gear,
        };

        diesel::insert_into(bicycles::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_bicycle_insert_error(err, bicycle.owner()))
    }

    async fn find_bicycle(
        &self,
        bicycle_id: BicycleId,
    ) -> Result<Option<Bicycle>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<BicycleRow> = bicycles::table
            .filter(bicycles::id.eq(bicycle_id.as_uuid()))
            .select(BicycleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_bicycle).transpose()
    }

    async fn list_available(&self) -> Result<Vec<BicycleListing>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(BicycleRow, Option<String>)> = bicycles::table
            .left_join(users::table)
            .filter(bicycles::status.eq(BicycleStatus::Available.as_str()))
            .order((bicycles::created_at.asc(), bicycles::id.asc()))
            .select((BicycleRow::as_select(), users::display_name.nullable()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(row, owner_name)| -> Result<BicycleListing, LedgerRepositoryError> {
                let id = row.id;
                let owner_name = owner_name
                    .map(DisplayName::new)
                    .transpose()
                    .map_err(|err| corrupt("owner name for bicycle", id, err))?;
                Ok(BicycleListing {
                    bicycle: row_to_bicycle(row)?,
                    owner_name,
                })
            })
            .collect()
    }

    async fn find_rental(
        &self,
        rental_id: RentalId,
    ) -> Result<Option<Rental>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<RentalRow> = rentals::table
            .filter(rentals::id.eq(rental_id.as_uuid()))
            .select(RentalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_rental))
    }

    async fn rentals_for_bicycle(
        &self,
        bicycle_id: BicycleId,
    ) -> Result<Vec<Rental>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RentalRow> = rentals::table
            .filter(rentals::bicycle_id.eq(bicycle_id.as_uuid()))
            .order(rentals::started_at.desc())
            .select(RentalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_rental).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping coverage; query behaviour lives in the integration suite.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn db_error(kind: DatabaseErrorKind, message: &str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(message.to_owned()))
    }

    #[rstest]
    fn checkout_timeout_is_retryable() {
        assert!(map_pool_error(PoolError::checkout("timed out")).is_transient());
        assert!(!map_pool_error(PoolError::build("bad url")).is_transient());
    }

    #[rstest]
    fn conditional_update_miss_maps_to_not_available() {
        let bicycle = BicycleId::random();
        assert_eq!(
            map_tx_error(LedgerTxError::NotAvailable, bicycle, None),
            LedgerRepositoryError::not_available(bicycle.to_string())
        );
    }

    #[rstest]
    fn foreign_key_violation_names_the_user() {
        let user = UserId::random();
        let error = db_error(DatabaseErrorKind::ForeignKeyViolation, "rentals_user_id_fkey");
        assert_eq!(
            map_tx_error(LedgerTxError::Diesel(error), BicycleId::random(), Some(&user)),
            LedgerRepositoryError::unknown_user(user.to_string())
        );
    }

    #[rstest]
    fn open_rental_index_violation_maps_to_not_available() {
        let bicycle = BicycleId::random();
        let error = db_error(DatabaseErrorKind::UniqueViolation, "rentals_one_open_per_bicycle");
        assert_eq!(
            map_tx_error(LedgerTxError::Diesel(error), bicycle, None),
            LedgerRepositoryError::not_available(bicycle.to_string())
        );
    }

    #[rstest]
    fn duplicate_bicycle_id_is_not_reported_as_unavailable() {
        let error = db_error(DatabaseErrorKind::UniqueViolation, "bicycles_pkey");
        let mapped = map_bicycle_insert_error(error, None);
        assert!(matches!(mapped, LedgerRepositoryError::Query { .. }));
        assert!(!mapped.is_transient());
    }

    #[rstest]
    fn bicycle_insert_with_missing_owner_names_the_owner() {
        let owner = UserId::random();
        let error = db_error(DatabaseErrorKind::ForeignKeyViolation, "bicycles_owner_id_fkey");
        assert_eq!(
            map_bicycle_insert_error(error, Some(&owner)),
            LedgerRepositoryError::unknown_user(owner.to_string())
        );
    }

    #[rstest]
    fn deadlock_maps_to_busy() {
        let error = db_error(DatabaseErrorKind::Unknown, "deadlock detected");
        assert!(map_diesel_error(error).is_transient());
    }

    #[rstest]
    fn corrupt_gear_is_reported_not_panicked() {
        let row = BicycleRow {
            id: Uuid::new_v4(),
            owner_id: None,
            status: "available".to_owned(),
            location: "Dock 4".to_owned(),
            gear: json!({ "name": "Roadster" }),
        };
        let error = row_to_bicycle(row).expect_err("gear lacks type and price");
        assert!(matches!(error, LedgerRepositoryError::Query { .. }));
    }
}
