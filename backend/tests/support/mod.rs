//! Shared helpers for the integration suites under `backend/tests/`.
//!
//! Each file in `tests/` compiles as its own crate, so helpers live here and
//! are pulled in with `mod support;`.

#![allow(
    dead_code,
    reason = "each suite uses a different subset of these helpers"
)]

pub mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{migrate_schema, reset_database, seed_user};

/// Render a `postgres` error with its SQLSTATE, detail, and hint.
///
/// The plain `Display` output collapses server errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}
