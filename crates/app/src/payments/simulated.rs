//! Simulated payment gateway for demos and local runs.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use jiff::Timestamp;
use rand::Rng;
use tracing::{debug, info};

use crate::payments::{PaymentError, PaymentGateway, PaymentOutcome, PaymentRequest};

#[derive(Debug)]
pub struct SimulatedPaymentGateway {
    approval_rate: f64,
    latency: Duration,
    sequence: AtomicU64,
}

impl SimulatedPaymentGateway {
    pub const DEFAULT_APPROVAL_RATE: f64 = 0.95;

    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidApprovalRate`] unless
    /// `0.0 <= approval_rate <= 1.0`.
    pub fn new(approval_rate: f64, latency: Duration) -> Result<Self, PaymentError> {
        if !(0.0..=1.0).contains(&approval_rate) {
            return Err(PaymentError::InvalidApprovalRate(approval_rate));
        }

        Ok(Self {
            approval_rate,
            latency,
            sequence: AtomicU64::new(1),
        })
    }

    fn next_payment_id(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        format!("pay_{}_{sequence}", Timestamp::now().as_millisecond())
    }
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self {
            approval_rate: Self::DEFAULT_APPROVAL_RATE,
            latency: Duration::ZERO,
            sequence: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn authorize_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let approved = rand::thread_rng().gen_bool(self.approval_rate);

        if !approved {
            debug!(amount = request.amount, currency = %request.currency, "payment declined");

            return Ok(PaymentOutcome::Declined {
                reason: "card declined".to_string(),
            });
        }

        let payment_id = self.next_payment_id();

        info!(
            %payment_id,
            amount = request.amount,
            currency = %request.currency,
            method = %request.payment_method,
            "payment approved"
        );

        Ok(PaymentOutcome::Approved { payment_id })
    }
}
