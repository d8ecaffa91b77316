//! Rent and return handlers.
//!
//! ```text
//! POST /rent_bicycle   {"userID":"…","bicycleID":"…"}
//! POST /return_bicycle {"userID":"…","bicycleID":"…"}
//! ```
//!
//! Ledger rejections (`not_available`, `no_open_rental`, `unknown_user`) are
//! reported as 400 with the reason in `details.reason`. A ledger whose
//! storage stayed busy through every retry yields 503.

use actix_web::{HttpResponse, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Rental};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_bicycle_id, parse_user_id};

/// Body shared by the rent and return endpoints.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RentalRequest {
    #[serde(rename = "userID", alias = "userId")]
    #[schema(format = "uuid")]
    pub user_id: Option<String>,
    #[serde(rename = "bicycleID", alias = "bicycleId")]
    #[schema(format = "uuid")]
    pub bicycle_id: Option<String>,
}

/// A rental as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct RentalBody {
    #[serde(rename = "rentalID")]
    #[schema(format = "uuid")]
    pub rental_id: String,
    #[serde(rename = "userID")]
    #[schema(format = "uuid")]
    pub user_id: String,
    #[serde(rename = "bicycleID")]
    #[schema(format = "uuid")]
    pub bicycle_id: String,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    /// Absent while the rental is open.
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none", default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl From<Rental> for RentalBody {
    fn from(rental: Rental) -> Self {
        Self {
            rental_id: rental.id().to_string(),
            user_id: rental.user_id().to_string(),
            bicycle_id: rental.bicycle_id().to_string(),
            start_time: rental.started_at(),
            end_time: rental.ended_at(),
        }
    }
}

/// Rent an available bicycle.
#[utoipa::path(
    post,
    path = "/rent_bicycle",
    request_body = RentalRequest,
    responses(
        (status = 201, description = "Rental opened", body = RentalBody),
        (status = 400, description = "Invalid request or bicycle not available", body = ErrorSchema),
        (status = 503, description = "Storage busy or identity service down", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["rentals"],
    operation_id = "rentBicycle"
)]
#[post("/rent_bicycle")]
pub async fn rent_bicycle(
    state: web::Data<HttpState>,
    payload: web::Json<RentalRequest>,
) -> ApiResult<HttpResponse> {
    let RentalRequest {
        user_id,
        bicycle_id,
    } = payload.into_inner();
    let user_id = parse_user_id(user_id)?;
    let bicycle_id = parse_bicycle_id(bicycle_id)?;

    let rental = state
        .ledger
        .rent_bicycle(&user_id, bicycle_id)
        .await
        .map_err(Error::from)?;
    Ok(HttpResponse::Created().json(RentalBody::from(rental)))
}

/// Return a rented bicycle, closing the open rental.
#[utoipa::path(
    post,
    path = "/return_bicycle",
    request_body = RentalRequest,
    responses(
        (status = 200, description = "Rental closed", body = RentalBody),
        (status = 400, description = "Invalid request or no matching open rental", body = ErrorSchema),
        (status = 503, description = "Storage busy", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["rentals"],
    operation_id = "returnBicycle"
)]
#[post("/return_bicycle")]
pub async fn return_bicycle(
    state: web::Data<HttpState>,
    payload: web::Json<RentalRequest>,
) -> ApiResult<web::Json<RentalBody>> {
    let RentalRequest {
        user_id,
        bicycle_id,
    } = payload.into_inner();
    let user_id = parse_user_id(user_id)?;
    let bicycle_id = parse_bicycle_id(bicycle_id)?;

    let rental = state
        .ledger
        .return_bicycle(&user_id, bicycle_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(RentalBody::from(rental)))
}

#[cfg(test)]
#[path = "rentals_tests.rs"]
mod tests;
