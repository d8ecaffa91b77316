//! Builders wiring the Diesel repositories into the domain services.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use rental_ledger::domain::ports::{
    FeedbackCommand, IdentityCommand, PasswordHashError, PaymentsCommand, RentalLedger,
};
use rental_ledger::domain::{
    FeedbackService, IdentityService, PaymentService, RentalLedgerService, RetryPolicy,
    ReturnPolicy,
};
use rental_ledger::inbound::http::state::HttpState;
use rental_ledger::outbound::persistence::{
    DbPool, DieselFeedbackRepository, DieselPaymentRepository, DieselRentalLedgerRepository,
    DieselUserRepository,
};
use rental_ledger::outbound::security::BcryptPasswordHasher;

/// Tunables applied to the services at startup.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub retry: RetryPolicy,
    pub return_policy: ReturnPolicy,
    pub bcrypt_cost: u32,
}

/// Build the HTTP state with every driving port backed by PostgreSQL.
///
/// # Errors
///
/// Returns [`PasswordHashError`] when the configured bcrypt cost is out of
/// range.
pub fn build_http_state(
    pool: &DbPool,
    options: ServiceOptions,
) -> Result<web::Data<HttpState>, PasswordHashError> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ledger_repo = Arc::new(DieselRentalLedgerRepository::new(pool.clone()));
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let hasher = Arc::new(BcryptPasswordHasher::with_cost(options.bcrypt_cost)?);

    let identity = Arc::new(IdentityService::new(users, hasher, clock.clone()));
    let ledger: Arc<dyn RentalLedger> = Arc::new(
        RentalLedgerService::new(ledger_repo.clone(), identity.clone(), clock.clone())
            .with_retry_policy(options.retry)
            .with_return_policy(options.return_policy),
    );
    let payments: Arc<dyn PaymentsCommand> = Arc::new(PaymentService::new(
        ledger_repo.clone(),
        Arc::new(DieselPaymentRepository::new(pool.clone())),
        clock.clone(),
    ));
    let feedback: Arc<dyn FeedbackCommand> = Arc::new(FeedbackService::new(
        ledger_repo,
        Arc::new(DieselFeedbackRepository::new(pool.clone())),
        clock,
    ));
    let identity: Arc<dyn IdentityCommand> = identity;

    Ok(web::Data::new(HttpState::new(
        ledger, identity, payments, feedback,
    )))
}
