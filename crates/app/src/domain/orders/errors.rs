//! Orders service errors.

use storefront::prelude::{DeliveryError, TransitionError};
use thiserror::Error;

use crate::{
    database::{Retryable, StoreError},
    domain::validation::ValidationError,
    payments::PaymentError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("invalid order: {0}")]
    Validation(#[from] ValidationError),

    #[error("order not found")]
    NotFound,

    #[error("order already exists")]
    AlreadyExists,

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("order has already been delivered")]
    AlreadyDelivered,

    #[error("delivery not allowed: {0}")]
    DeliveryNotAllowed(DeliveryError),

    #[error("payment declined: {reason}")]
    PaymentDeclined { reason: String },

    #[error("payment gateway error")]
    Payment(#[from] PaymentError),

    #[error("storage unavailable")]
    Unavailable(#[source] StoreError),
}

impl From<StoreError> for OrdersServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation => Self::AlreadyExists,
            error => Self::Unavailable(error),
        }
    }
}

impl From<DeliveryError> for OrdersServiceError {
    fn from(error: DeliveryError) -> Self {
        match error {
            DeliveryError::AlreadyDelivered => Self::AlreadyDelivered,
            error => Self::DeliveryNotAllowed(error),
        }
    }
}

impl Retryable for OrdersServiceError {
    fn is_conflict(&self) -> bool {
        matches!(self, Self::Unavailable(error) if error.is_conflict())
    }
}
