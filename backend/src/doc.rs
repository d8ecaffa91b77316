//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler in the inbound HTTP adapter plus the
//! schema wrappers for domain types ([`ErrorSchema`], [`ErrorCodeSchema`],
//! [`GearSchema`], [`BicycleStatusSchema`]) so the domain stays free of
//! utoipa derives.
//!
//! The document is served by Swagger UI when enabled and exported via
//! `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::schemas::{
    BicycleStatusSchema, ErrorCodeSchema, ErrorSchema, GearSchema,
};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bicycle rental API",
        description = "Rent and return bicycles, list bikes for rent, and record payments and feedback."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::rentals::rent_bicycle,
        crate::inbound::http::rentals::return_bicycle,
        crate::inbound::http::bicycles::list_available,
        crate::inbound::http::bicycles::get_bicycle,
        crate::inbound::http::bicycles::add_bike,
        crate::inbound::http::users::register,
        crate::inbound::http::users::login_user,
        crate::inbound::http::payments::record_payment,
        crate::inbound::http::payments::list_payments,
        crate::inbound::http::feedback::submit_feedback,
        crate::inbound::http::feedback::list_feedback,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema, GearSchema, BicycleStatusSchema)),
    tags(
        (name = "rentals", description = "Rent and return bicycles"),
        (name = "bicycles", description = "Browse and list bicycles"),
        (name = "users", description = "Registration and login"),
        (name = "payments", description = "Payments recorded against rentals"),
        (name = "feedback", description = "Feedback on completed rentals"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    #[rstest]
    #[case("/rent_bicycle")]
    #[case("/return_bicycle")]
    #[case("/bicycles")]
    #[case("/bicycles/{id}")]
    #[case("/add_bike")]
    #[case("/register")]
    #[case("/login_user")]
    #[case("/payments")]
    #[case("/rentals/{id}/payments")]
    #[case("/feedback")]
    #[case("/rentals/{id}/feedback")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn every_endpoint_is_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        let RefOr::T(Schema::Object(obj)) = error_schema else {
            panic!("expected Object schema");
        };
        for field in ["code", "message", "traceId", "details"] {
            assert!(obj.properties.contains_key(field), "missing {field}");
        }
    }
}
