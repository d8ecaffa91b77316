//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Conversions into domain
//! types are fallible because stored rows may predate current validation.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{bicycles, feedback, payments, rentals, users};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub display_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub date_of_birth: NaiveDate,
    pub password_hash: &'a str,
}

/// Login lookup projection.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CredentialsRow {
    pub id: Uuid,
    pub password_hash: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bicycles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BicycleRow {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub status: String,
    pub location: String,
    pub gear: serde_json::Value,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bicycles)]
pub(crate) struct NewBicycleRow<'a> {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub status: &'a str,
    pub location: &'a str,
    pub gear: serde_json::Value,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = rentals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RentalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bicycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub card_last_four: String,
    pub status: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = feedback)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FeedbackRow {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub rating: i16,
    pub submitted_at: DateTime<Utc>,
}
