//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::web;

use crate::domain::ports::{
    MockFeedbackCommand, MockIdentityCommand, MockPaymentsCommand, MockRentalLedger,
};
use crate::inbound::http::state::HttpState;

/// Mocked driving ports. Set expectations on the field a handler uses and
/// leave the rest untouched; an unexpected call fails the test.
#[derive(Default)]
pub struct MockPorts {
    pub ledger: MockRentalLedger,
    pub identity: MockIdentityCommand,
    pub payments: MockPaymentsCommand,
    pub feedback: MockFeedbackCommand,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            Arc::new(self.ledger),
            Arc::new(self.identity),
            Arc::new(self.payments),
            Arc::new(self.feedback),
        ))
    }
}
