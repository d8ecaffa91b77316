//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration. Request and response bodies
//! owned by the HTTP adapter derive `ToSchema` directly and reference these
//! wrappers where they embed domain values.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed, fails validation, or a ledger precondition
    /// does not hold.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The caller may not act on this resource.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The resource is in a state that forbids the operation.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency is temporarily unavailable; retrying may succeed.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "bicycle is not available")]
    message: String,
    /// Correlation identifier echoed in the `trace-id` response header.
    #[schema(example = "6f1c1d3e-58a4-4f0e-9a55-8a7f1d0c2b11")]
    trace_id: Option<String>,
    /// Supplementary error details, such as `{"reason": "not_available"}`.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::BicycleStatus`].
#[derive(ToSchema)]
#[schema(as = crate::domain::BicycleStatus)]
pub enum BicycleStatusSchema {
    Available,
    Rented,
}

/// OpenAPI schema for [`crate::domain::Gear`].
///
/// Equipment descriptor stored alongside each bicycle.
#[derive(ToSchema)]
#[schema(as = crate::domain::Gear)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct GearSchema {
    #[schema(example = "Trek FX 3")]
    name: String,
    /// Bike type such as `road` or `mountain`.
    #[schema(rename = "type")]
    #[schema(example = "hybrid")]
    kind: String,
    /// Hourly price in minor currency units.
    #[schema(example = 450, minimum = 1)]
    price_per_hour: u32,
}
