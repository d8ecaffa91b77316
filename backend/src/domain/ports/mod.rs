//! Domain ports for the hexagonal boundary.
//!
//! Driving ports (`RentalLedger`, `IdentityCommand`, `PaymentsCommand`,
//! `FeedbackCommand`) are called by inbound adapters. Driven ports are
//! implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod feedback_command;
mod feedback_repository;
mod identity_command;
mod identity_provider;
mod password_hasher;
mod payment_repository;
mod payments_command;
mod rental_ledger;
mod rental_ledger_repository;
mod user_repository;

pub use feedback_command::FeedbackCommand;
#[cfg(test)]
pub use feedback_command::MockFeedbackCommand;
pub use feedback_repository::{FeedbackRepository, FeedbackRepositoryError};
#[cfg(test)]
pub use feedback_repository::MockFeedbackRepository;
pub use identity_command::IdentityCommand;
#[cfg(test)]
pub use identity_command::MockIdentityCommand;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::{PaymentRepository, PaymentRepositoryError};
#[cfg(test)]
pub use payments_command::MockPaymentsCommand;
pub use payments_command::PaymentsCommand;
#[cfg(test)]
pub use rental_ledger::MockRentalLedger;
pub use rental_ledger::RentalLedger;
#[cfg(test)]
pub use rental_ledger_repository::MockRentalLedgerRepository;
pub use rental_ledger_repository::{LedgerRepositoryError, RentalLedgerRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
