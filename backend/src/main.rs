//! Rental ledger entry-point: loads settings, migrates the schema, and serves
//! the HTTP API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use rental_ledger::inbound::http::health::HealthState;
use rental_ledger::outbound::persistence::{DbPool, run_pending_migrations};
use server::{ServerSettings, ServiceOptions, build_http_state, create_server};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = ServerSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let options = ServiceOptions {
        retry: settings.retry_policy(),
        return_policy: settings.return_policy()?,
        bcrypt_cost: settings.bcrypt_cost(),
    };

    run_pending_migrations(&settings.database_url)
        .await
        .wrap_err("database migration failed")?;
    let pool = DbPool::new(settings.pool_config())
        .await
        .wrap_err("failed to build connection pool")?;
    let http_state = build_http_state(&pool, options)?;

    let health_state = web::Data::new(HealthState::new());
    let bind_addr = settings.bind_addr();
    let server = create_server(
        health_state.clone(),
        http_state,
        bind_addr,
        settings.openapi_enabled(),
    )?;
    info!(%bind_addr, "rental ledger listening");

    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("HTTP server failed")
}
