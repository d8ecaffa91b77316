//! Domain primitives, aggregates, and services.
//!
//! Purpose: define strongly typed entities for the rental ledger and the
//! services that drive them through ports. Adapters live outside this module
//! and only meet the domain through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - User, Bicycle, Rental, Payment, Feedback: validated aggregates.
//! - RentalLedgerService, IdentityService, PaymentService, FeedbackService:
//!   implementations of the driving ports.

pub mod auth;
pub mod bicycle;
pub mod error;
pub mod feedback;
mod identity_service;
mod ledger_error;
pub mod payment;
pub mod ports;
pub mod rental;
mod rental_ledger_service;
mod rental_records_service;
pub mod retry;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    CredentialsValidationError, LoginCredentials, PASSWORD_MAX, PASSWORD_MIN, Password,
    PasswordHash, Registration,
};
pub use self::bicycle::{
    Bicycle, BicycleId, BicycleListing, BicycleStatus, BicycleValidationError, Gear, Location,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::feedback::{
    FEEDBACK_TEXT_MAX, Feedback, FeedbackId, FeedbackRequest, FeedbackText,
    FeedbackValidationError, Rating,
};
pub use self::identity_service::IdentityService;
pub use self::ledger_error::LedgerError;
pub use self::payment::{
    Amount, CardLastFour, CardNumber, Payment, PaymentId, PaymentRequest, PaymentStatus,
    PaymentValidationError,
};
pub use self::rental::{
    InvalidRentalId, Rental, RentalId, ReturnPolicy, UnknownReturnPolicy, at_storage_precision,
};
pub use self::rental_ledger_service::RentalLedgerService;
pub use self::rental_records_service::{FeedbackService, PaymentService};
pub use self::retry::{RetryError, RetryPolicy, RetrySleeper, TokioSleeper, with_retry};
pub use self::trace_id::TraceId;
pub use self::user::{DisplayName, EmailAddress, PhoneNumber, User, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use rental_ledger::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
