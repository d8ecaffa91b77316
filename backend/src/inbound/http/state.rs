//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{FeedbackCommand, IdentityCommand, PaymentsCommand, RentalLedger};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use rental_ledger::domain::{
///     FeedbackService, IdentityService, PaymentService, RentalLedgerService,
/// };
/// use rental_ledger::inbound::http::state::HttpState;
/// use rental_ledger::outbound::security::BcryptPasswordHasher;
/// use rental_ledger::test_support::InMemoryLedgerStore;
///
/// let store = Arc::new(InMemoryLedgerStore::default());
/// let clock = Arc::new(DefaultClock);
/// let identity = Arc::new(IdentityService::new(
///     store.clone(),
///     Arc::new(BcryptPasswordHasher::default()),
///     clock.clone(),
/// ));
/// let ledger = Arc::new(RentalLedgerService::new(store.clone(), identity.clone(), clock.clone()));
/// let payments = Arc::new(PaymentService::new(store.clone(), store.clone(), clock.clone()));
/// let feedback = Arc::new(FeedbackService::new(store.clone(), store, clock));
///
/// let state = HttpState::new(ledger, identity, payments, feedback);
/// let _ledger = state.ledger.clone();
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub ledger: Arc<dyn RentalLedger>,
    pub identity: Arc<dyn IdentityCommand>,
    pub payments: Arc<dyn PaymentsCommand>,
    pub feedback: Arc<dyn FeedbackCommand>,
}

impl HttpState {
    pub fn new(
        ledger: Arc<dyn RentalLedger>,
        identity: Arc<dyn IdentityCommand>,
        payments: Arc<dyn PaymentsCommand>,
        feedback: Arc<dyn FeedbackCommand>,
    ) -> Self {
        Self {
            ledger,
            identity,
            payments,
            feedback,
        }
    }
}
