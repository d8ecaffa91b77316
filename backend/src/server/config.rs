//! Server settings loaded via OrthoConfig.
//!
//! Every value can come from the command line, a configuration file, or a
//! `BIKE_RENTAL_*` environment variable. Only the database URL is required.
//! The Swagger toggle is read from the file or environment only, so an
//! absent flag keeps the build-dependent default.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use rental_ledger::domain::{RetryPolicy, ReturnPolicy, UnknownReturnPolicy};
use rental_ledger::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_MIN_IDLE: u32 = 2;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BCRYPT_COST: u32 = 12;

/// Runtime settings for the rental ledger server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BIKE_RENTAL")]
pub struct ServerSettings {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<SocketAddr>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Connections kept open while idle.
    pub pool_min_idle: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub pool_connection_timeout_secs: Option<u64>,
    /// Attempts for a ledger write that hits contention.
    pub retry_max_attempts: Option<u32>,
    /// Milliseconds between ledger write attempts.
    pub retry_delay_ms: Option<u64>,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: Option<u32>,
    /// Who may return a rented bicycle: `match_renter` or `any_renter`.
    pub return_policy: Option<String>,
    /// Serve Swagger UI at `/docs`.
    #[ortho_config(skip_cli)]
    pub openapi_enabled: Option<bool>,
}

impl ServerSettings {
    /// Listener address; `0.0.0.0:8080` when unset.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Pool configuration derived from the database settings.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.database_url.clone())
            .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
            .with_min_idle(Some(self.pool_min_idle.unwrap_or(DEFAULT_POOL_MIN_IDLE)))
            .with_connection_timeout(Duration::from_secs(
                self.pool_connection_timeout_secs
                    .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
            ))
    }

    /// Retry policy for ledger writes.
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.retry_max_attempts.unwrap_or(defaults.max_attempts),
            delay: self
                .retry_delay_ms
                .map_or(defaults.delay, Duration::from_millis),
        }
    }

    /// bcrypt work factor; 12 when unset.
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST)
    }

    /// Parsed return policy; `match_renter` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownReturnPolicy`] for an unrecognised name.
    pub fn return_policy(&self) -> Result<ReturnPolicy, UnknownReturnPolicy> {
        self.return_policy
            .as_deref()
            .map_or(Ok(ReturnPolicy::default()), str::parse)
    }

    /// Swagger UI defaults to on in debug builds only.
    pub fn openapi_enabled(&self) -> bool {
        self.openapi_enabled.unwrap_or(cfg!(debug_assertions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "BIKE_RENTAL_DATABASE_URL",
        "BIKE_RENTAL_BIND_ADDR",
        "BIKE_RENTAL_POOL_MAX_SIZE",
        "BIKE_RENTAL_POOL_MIN_IDLE",
        "BIKE_RENTAL_POOL_CONNECTION_TIMEOUT_SECS",
        "BIKE_RENTAL_RETRY_MAX_ATTEMPTS",
        "BIKE_RENTAL_RETRY_DELAY_MS",
        "BIKE_RENTAL_BCRYPT_COST",
        "BIKE_RENTAL_RETURN_POLICY",
        "BIKE_RENTAL_OPENAPI_ENABLED",
    ];

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load() -> Result<ServerSettings, impl std::fmt::Debug> {
        ServerSettings::load_from_iter([OsString::from("rental-ledger")])
    }

    #[rstest]
    fn defaults_apply_when_only_the_database_is_set() {
        let _guard = lock_env(env_with(&[(
            "BIKE_RENTAL_DATABASE_URL",
            "postgres://ledger@localhost/ledger",
        )]));

        let settings = load().expect("settings should load");

        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.pool_config().max_size(), DEFAULT_POOL_MAX_SIZE);
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        assert_eq!(settings.bcrypt_cost(), DEFAULT_BCRYPT_COST);
        assert_eq!(settings.return_policy(), Ok(ReturnPolicy::MatchRenter));
        assert_eq!(settings.openapi_enabled(), cfg!(debug_assertions));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("BIKE_RENTAL_DATABASE_URL", "postgres://ledger@db/ledger"),
            ("BIKE_RENTAL_BIND_ADDR", "127.0.0.1:9090"),
            ("BIKE_RENTAL_POOL_MAX_SIZE", "4"),
            ("BIKE_RENTAL_RETRY_MAX_ATTEMPTS", "5"),
            ("BIKE_RENTAL_RETRY_DELAY_MS", "10"),
            ("BIKE_RENTAL_RETURN_POLICY", "any_renter"),
            ("BIKE_RENTAL_OPENAPI_ENABLED", "false"),
        ]));

        let settings = load().expect("settings should load");

        assert_eq!(settings.database_url, "postgres://ledger@db/ledger");
        assert_eq!(settings.bind_addr().port(), 9090);
        assert_eq!(settings.pool_config().max_size(), 4);
        assert_eq!(
            settings.retry_policy(),
            RetryPolicy {
                max_attempts: 5,
                delay: Duration::from_millis(10),
            }
        );
        assert_eq!(settings.return_policy(), Ok(ReturnPolicy::AnyRenter));
        assert!(!settings.openapi_enabled());
    }

    #[rstest]
    #[case("true", true)]
    #[case("false", false)]
    fn openapi_toggle_comes_from_the_environment(#[case] raw: &str, #[case] expected: bool) {
        let _guard = lock_env(env_with(&[
            ("BIKE_RENTAL_DATABASE_URL", "postgres://ledger@db/ledger"),
            ("BIKE_RENTAL_OPENAPI_ENABLED", raw),
        ]));

        let settings = load().expect("settings should load");

        assert_eq!(settings.openapi_enabled, Some(expected));
        assert_eq!(settings.openapi_enabled(), expected);
    }

    #[rstest]
    fn unset_openapi_toggle_stays_absent() {
        let _guard = lock_env(env_with(&[(
            "BIKE_RENTAL_DATABASE_URL",
            "postgres://ledger@db/ledger",
        )]));

        let settings = load().expect("settings should load");

        assert_eq!(settings.openapi_enabled, None);
    }

    #[rstest]
    fn unknown_return_policy_is_reported() {
        let _guard = lock_env(env_with(&[
            ("BIKE_RENTAL_DATABASE_URL", "postgres://ledger@db/ledger"),
            ("BIKE_RENTAL_RETURN_POLICY", "first_come"),
        ]));

        let settings = load().expect("settings should load");

        assert!(settings.return_policy().is_err());
    }

    #[rstest]
    fn missing_database_url_fails_to_load() {
        let _guard = lock_env(env_with(&[]));

        assert!(load().is_err());
    }
}
