//! HTTP inbound adapter exposing the REST endpoints.
//!
//! ```text
//! POST /rent_bicycle        POST /return_bicycle
//! GET  /bicycles            GET  /bicycles/{id}        POST /add_bike
//! POST /register            POST /login_user
//! POST /payments            GET  /rentals/{id}/payments
//! POST /feedback            GET  /rentals/{id}/feedback
//! GET  /health/ready        GET  /health/live
//! ```

use actix_web::web;

pub mod bicycles;
pub mod error;
pub mod feedback;
pub mod health;
pub mod payments;
pub mod rentals;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub(crate) mod validation;

pub use crate::domain::ApiResult;

/// JSON extractor configuration that reports malformed bodies with the
/// structured error payload.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(error::json_error_handler)
}

/// Path extractor configuration that reports bad segments with the
/// structured error payload.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(error::path_error_handler)
}

/// Register extractor configuration and every API handler.
///
/// Handlers expect a `web::Data<state::HttpState>` to be registered by the
/// caller. Health probes are mounted separately because they read
/// [`health::HealthState`] instead.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use rental_ledger::inbound::http::configure_api;
///
/// let app = App::new().configure(configure_api);
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(rentals::rent_bicycle)
        .service(rentals::return_bicycle)
        .service(bicycles::list_available)
        .service(bicycles::get_bicycle)
        .service(bicycles::add_bike)
        .service(users::register)
        .service(users::login_user)
        .service(payments::record_payment)
        .service(payments::list_payments)
        .service(feedback::submit_feedback)
        .service(feedback::list_feedback);
}
