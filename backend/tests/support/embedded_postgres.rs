//! Database preparation helpers for embedded PostgreSQL suites.
//!
//! Reset and seeding go through the blocking `postgres` client so that no
//! Diesel transaction is open while a database is dropped.

use chrono::NaiveDate;
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use rental_ledger::domain::UserId;
use rental_ledger::outbound::persistence::MIGRATIONS;

use super::format_postgres_error;

/// Drop and recreate `name` on the cluster.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<(), String> {
    let admin_url = cluster.connection().database_url("postgres");
    let mut client =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let escaped = name.replace('"', "\"\"");
    client
        .batch_execute(&format!(r#"DROP DATABASE IF EXISTS "{escaped}" WITH (FORCE)"#))
        .map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!(r#"CREATE DATABASE "{escaped}""#))
        .map_err(|err| format_postgres_error(&err))?;
    Ok(())
}

/// Apply every embedded migration to the database at `url`.
pub fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("{err:?}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migration: {err:?}"))?;
    Ok(())
}

/// Insert a user row directly, bypassing password hashing.
pub fn seed_user(url: &str, user_id: &UserId, email: &str) -> Result<(), String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let dob = NaiveDate::from_ymd_opt(1990, 1, 1).ok_or("invalid seed date")?;
    client
        .execute(
            "INSERT INTO users (id, display_name, email, date_of_birth, password_hash) \
             VALUES ($1, $2, $3, $4, $5)",
            &[
                user_id.as_uuid(),
                &"Seeded Rider",
                &email,
                &dob,
                &"$2b$04$seeded.hash.not.used.for.login",
            ],
        )
        .map_err(|err| format_postgres_error(&err))?;
    Ok(())
}
