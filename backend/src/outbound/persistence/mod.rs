//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories translate between row structs and domain types and map
//! database failures onto port errors. `models` and `schema` stay private to
//! this module.
//!
//! # Example
//!
//! ```rust,no_run
//! use rental_ledger::outbound::persistence::{DbPool, DieselRentalLedgerRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ledger")).await?;
//! let ledger = DieselRentalLedgerRepository::new(pool);
//! # let _ = ledger;
//! # Ok(())
//! # }
//! ```

mod diesel_error_mapping;
mod diesel_feedback_repository;
mod diesel_payment_repository;
mod diesel_rental_ledger_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_feedback_repository::DieselFeedbackRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_rental_ledger_repository::DieselRentalLedgerRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
