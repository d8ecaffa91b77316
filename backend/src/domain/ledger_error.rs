//! Failures surfaced by the rental ledger operations.

use serde_json::json;

use super::{BicycleId, Error, UserId};

/// Outcome of a ledger operation that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The bicycle is already rented or does not exist.
    #[error("bicycle {bicycle_id} is not available")]
    NotAvailable { bicycle_id: BicycleId },
    /// No open rental matches the bicycle and caller.
    #[error("no open rental for bicycle {bicycle_id}")]
    NoOpenRental { bicycle_id: BicycleId },
    /// The identity service does not know the user.
    #[error("user {user_id} does not exist")]
    UnknownUser { user_id: UserId },
    /// The requested bicycle does not exist.
    #[error("bicycle {bicycle_id} not found")]
    UnknownBicycle { bicycle_id: BicycleId },
    /// The identity service could not answer.
    #[error("identity service unavailable: {message}")]
    IdentityUnavailable { message: String },
    /// Storage stayed contended for every retry attempt.
    #[error("ledger storage unavailable after {attempts} attempts: {message}")]
    StorageTransient { attempts: u32, message: String },
    /// Storage failed in a way retrying cannot fix.
    #[error("ledger storage failed: {message}")]
    StorageFatal { message: String },
}

impl LedgerError {
    fn reason(&self) -> &'static str {
        match self {
            Self::NotAvailable { .. } => "not_available",
            Self::NoOpenRental { .. } => "no_open_rental",
            Self::UnknownUser { .. } => "unknown_user",
            Self::UnknownBicycle { .. } => "unknown_bicycle",
            Self::IdentityUnavailable { .. } => "identity_unavailable",
            Self::StorageTransient { .. } => "storage_busy",
            Self::StorageFatal { .. } => "storage_failed",
        }
    }
}

impl From<LedgerError> for Error {
    fn from(value: LedgerError) -> Self {
        let details = json!({ "reason": value.reason() });
        match &value {
            LedgerError::NotAvailable { bicycle_id } | LedgerError::NoOpenRental { bicycle_id } => {
                Error::invalid_request(value.to_string())
                    .with_details(json!({ "reason": value.reason(), "bicycleId": bicycle_id.to_string() }))
            }
            LedgerError::UnknownUser { user_id } => Error::invalid_request(value.to_string())
                .with_details(json!({ "reason": value.reason(), "userId": user_id.to_string() })),
            LedgerError::UnknownBicycle { .. } => {
                Error::not_found(value.to_string()).with_details(details)
            }
            LedgerError::IdentityUnavailable { .. } => {
                Error::service_unavailable("identity service is unavailable").with_details(details)
            }
            LedgerError::StorageTransient { .. } => {
                Error::service_unavailable("ledger storage is busy, try again").with_details(details)
            }
            LedgerError::StorageFatal { .. } => Error::internal(value.to_string()),
        }
    }
}
