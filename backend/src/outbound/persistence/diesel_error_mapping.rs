//! Shared Diesel error classification for the repositories.
//!
//! Ledger writes are retried by the domain service, so this module decides
//! which database failures are contention (retryable) and which are not.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// PostgreSQL messages that indicate lock contention rather than a bug.
const CONTENTION_MARKERS: &[&str] = &[
    "deadlock detected",
    "could not obtain lock",
    "canceling statement due to lock timeout",
    "could not serialize access",
];

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
pub(crate) fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    log_diesel_error(&error);
    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        _ => query("database error"),
    }
}

pub(crate) fn log_diesel_error(error: &DieselError) {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), constraint = info.constraint_name(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            "diesel operation failed"
        ),
    }
}

/// True when retrying the whole transaction may succeed.
pub(crate) fn is_contention(error: &DieselError) -> bool {
    match error {
        DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure | DatabaseErrorKind::ClosedConnection,
            _,
        ) => true,
        DieselError::DatabaseError(_, info) => {
            let message = info.message();
            CONTENTION_MARKERS
                .iter()
                .any(|marker| message.contains(marker))
        }
        _ => false,
    }
}

/// Kind of a database-level error, if it is one.
pub(crate) fn database_error_kind(error: &DieselError) -> Option<DatabaseErrorKind> {
    match error {
        DieselError::DatabaseError(kind, _) => Some(*kind),
        _ => None,
    }
}
