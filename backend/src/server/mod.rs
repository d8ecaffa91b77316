//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerSettings;
pub use state_builders::{ServiceOptions, build_http_state};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use rental_ledger::doc::ApiDoc;
use rental_ledger::inbound::http::configure_api;
use rental_ledger::inbound::http::health::{HealthState, live, ready};
use rental_ledger::inbound::http::state::HttpState;
use rental_ledger::Trace;

use std::net::SocketAddr;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    openapi_enabled: bool,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        openapi_enabled,
    } = deps;

    let mut app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure_api)
        .service(ready)
        .service(live);

    if openapi_enabled {
        app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}

/// Construct an Actix HTTP server around the prepared state.
///
/// The server is marked ready once the listener is bound.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    bind_addr: SocketAddr,
    openapi_enabled: bool,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            openapi_enabled,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use mockable::DefaultClock;
    use rstest::rstest;

    use rental_ledger::domain::{
        FeedbackService, IdentityService, PaymentService, RentalLedgerService,
    };
    use rental_ledger::outbound::security::BcryptPasswordHasher;
    use rental_ledger::test_support::InMemoryLedgerStore;

    fn in_memory_state() -> web::Data<HttpState> {
        let store = Arc::new(InMemoryLedgerStore::default());
        let clock = Arc::new(DefaultClock);
        let hasher = Arc::new(BcryptPasswordHasher::with_cost(4).expect("valid cost"));
        let identity = Arc::new(IdentityService::new(store.clone(), hasher, clock.clone()));
        let ledger = Arc::new(RentalLedgerService::new(
            store.clone(),
            identity.clone(),
            clock.clone(),
        ));
        let payments = Arc::new(PaymentService::new(store.clone(), store.clone(), clock.clone()));
        let feedback = Arc::new(FeedbackService::new(store.clone(), store, clock));
        web::Data::new(HttpState::new(ledger, identity, payments, feedback))
    }

    fn deps(openapi_enabled: bool) -> AppDependencies {
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: in_memory_state(),
            openapi_enabled,
        }
    }

    #[rstest]
    #[case::ready("/health/ready", StatusCode::OK)]
    #[case::live("/health/live", StatusCode::OK)]
    #[case::bicycles("/bicycles", StatusCode::OK)]
    #[actix_web::test]
    async fn app_serves_probes_and_api(#[case] uri: &str, #[case] expected: StatusCode) {
        let app = actix_test::init_service(build_app(deps(false))).await;

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                .await;

        assert_eq!(response.status(), expected);
        assert!(response.headers().contains_key("trace-id"));
    }

    #[rstest]
    #[case::enabled(true, StatusCode::OK)]
    #[case::disabled(false, StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn openapi_document_follows_settings(
        #[case] enabled: bool,
        #[case] expected: StatusCode,
    ) {
        let app = actix_test::init_service(build_app(deps(enabled))).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api-docs/openapi.json")
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), expected);
    }
}
