//! Payment gateway

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod simulated;

pub use simulated::SimulatedPaymentGateway;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    #[error("approval rate must be between 0 and 1, got {0}")]
    InvalidApprovalRate(f64),
}

/// A request to charge the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Amount in minor units.
    pub amount: u64,
    pub currency: String,
    pub payment_method: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved { payment_id: String },
    Declined { reason: String },
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Authorise and capture `request.amount`.
    ///
    /// A decline is an [`PaymentOutcome`], not an error; errors mean the
    /// gateway could not be asked.
    async fn authorize_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentError>;
}
