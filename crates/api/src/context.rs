use serde::Serialize;

use warden_auth::FilterOutcome;
use warden_core::OperationId;

/// Authorization outcome for the current request.
///
/// Inserted as a request extension by the authorize middleware once the
/// request may proceed; handlers read it, nothing writes it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationOutcome {
    operation: OperationId,
    #[serde(flatten)]
    outcome: FilterOutcome,
}

impl AuthorizationOutcome {
    pub fn new(operation: OperationId, outcome: FilterOutcome) -> Self {
        Self { operation, outcome }
    }

    pub fn operation(&self) -> &OperationId {
        &self.operation
    }

    pub fn outcome(&self) -> FilterOutcome {
        self.outcome
    }
}
