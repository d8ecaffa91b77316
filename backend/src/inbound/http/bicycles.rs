//! Bicycle catalogue handlers.
//!
//! ```text
//! GET  /bicycles
//! GET  /bicycles/{id}
//! POST /add_bike {"userID":"…","bikeName":"…","bikeType":"…","bikeLocation":"…","bikePrice":450}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Bicycle, BicycleListing, BicycleStatus, BicycleValidationError, Error, Gear, Location,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{BicycleStatusSchema, ErrorSchema, GearSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, parse_bicycle_id, parse_user_id, require,
};

const BIKE_NAME: FieldName = FieldName::new("bikeName");
const BIKE_TYPE: FieldName = FieldName::new("bikeType");
const BIKE_LOCATION: FieldName = FieldName::new("bikeLocation");
const BIKE_PRICE: FieldName = FieldName::new("bikePrice");

/// A bicycle as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BicycleBody {
    #[serde(rename = "bicycleID")]
    #[schema(format = "uuid")]
    pub bicycle_id: String,
    #[schema(value_type = BicycleStatusSchema)]
    pub status: BicycleStatus,
    pub location: String,
    #[schema(value_type = GearSchema)]
    pub gear: Gear,
    #[serde(rename = "ownerID", skip_serializing_if = "Option::is_none", default)]
    #[schema(format = "uuid")]
    pub owner_id: Option<String>,
    /// Display name of the owner; only present in catalogue listings.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_name: Option<String>,
}

impl From<Bicycle> for BicycleBody {
    fn from(bicycle: Bicycle) -> Self {
        Self {
            bicycle_id: bicycle.id().to_string(),
            status: bicycle.status(),
            location: bicycle.location().as_ref().to_owned(),
            gear: bicycle.gear().clone(),
            owner_id: bicycle.owner().map(ToString::to_string),
            owner_name: None,
        }
    }
}

impl From<BicycleListing> for BicycleBody {
    fn from(listing: BicycleListing) -> Self {
        let BicycleListing { bicycle, owner_name } = listing;
        Self {
            owner_name: owner_name.map(String::from),
            ..Self::from(bicycle)
        }
    }
}

/// Request body for `POST /add_bike`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddBikeRequest {
    #[serde(rename = "userID", alias = "userId")]
    #[schema(format = "uuid")]
    pub user_id: Option<String>,
    pub bike_name: Option<String>,
    pub bike_type: Option<String>,
    pub bike_location: Option<String>,
    /// Hourly price in minor currency units.
    #[schema(minimum = 1)]
    pub bike_price: Option<i64>,
}

fn gear_field(err: &BicycleValidationError) -> FieldName {
    match err {
        BicycleValidationError::EmptyGearLabel { field }
        | BicycleValidationError::GearLabelTooLong { field, .. }
            if *field == "bikeType" =>
        {
            BIKE_TYPE
        }
        BicycleValidationError::NonPositivePrice => BIKE_PRICE,
        _ => BIKE_NAME,
    }
}

fn parse_gear(request: &mut AddBikeRequest) -> Result<Gear, Error> {
    let name = require(request.bike_name.take(), BIKE_NAME)?;
    let kind = require(request.bike_type.take(), BIKE_TYPE)?;
    let price = require(request.bike_price, BIKE_PRICE)?;
    let price = u32::try_from(price)
        .map_err(|_| invalid_field(BIKE_PRICE, "bikePrice must be a positive whole number"))?;
    Gear::new(name, kind, price).map_err(|err| invalid_field(gear_field(&err), err))
}

/// List bicycles that are available to rent.
#[utoipa::path(
    get,
    path = "/bicycles",
    responses(
        (status = 200, description = "Available bicycles", body = [BicycleBody]),
        (status = 503, description = "Storage busy", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["bicycles"],
    operation_id = "listAvailableBicycles"
)]
#[get("/bicycles")]
pub async fn list_available(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<BicycleBody>>> {
    let listings = state.ledger.list_available().await.map_err(Error::from)?;
    Ok(web::Json(
        listings.into_iter().map(BicycleBody::from).collect(),
    ))
}

/// Fetch one bicycle in any status.
#[utoipa::path(
    get,
    path = "/bicycles/{id}",
    params(("id" = String, Path, description = "Bicycle identifier", format = "uuid")),
    responses(
        (status = 200, description = "The bicycle", body = BicycleBody),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Unknown bicycle", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["bicycles"],
    operation_id = "getBicycle"
)]
#[get("/bicycles/{id}")]
pub async fn get_bicycle(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<BicycleBody>> {
    let bicycle_id = parse_bicycle_id(Some(path.into_inner()))?;
    let bicycle = state
        .ledger
        .list_bicycle(bicycle_id)
        .await
        .map_err(Error::from)?;
    Ok(web::Json(BicycleBody::from(bicycle)))
}

/// List a bicycle for rent.
#[utoipa::path(
    post,
    path = "/add_bike",
    request_body = AddBikeRequest,
    responses(
        (status = 201, description = "Bicycle listed", body = BicycleBody),
        (status = 400, description = "Invalid request or unknown owner", body = ErrorSchema),
        (status = 503, description = "Storage busy or identity service down", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["bicycles"],
    operation_id = "addBike"
)]
#[post("/add_bike")]
pub async fn add_bike(
    state: web::Data<HttpState>,
    payload: web::Json<AddBikeRequest>,
) -> ApiResult<HttpResponse> {
    let mut request = payload.into_inner();
    let owner = parse_user_id(request.user_id.take())?;
    let gear = parse_gear(&mut request)?;
    let location = require(request.bike_location.take(), BIKE_LOCATION)?;
    let location = Location::new(location).map_err(|err| invalid_field(BIKE_LOCATION, err))?;

    let bicycle = state
        .ledger
        .add_bicycle(&owner, location, gear)
        .await
        .map_err(Error::from)?;
    Ok(HttpResponse::Created().json(BicycleBody::from(bicycle)))
}
