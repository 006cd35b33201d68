//! Digital Delivery

use thiserror::Error;

use crate::orders::{DeliveryMethod, OrderStatus};

/// Reasons an order cannot receive a delivery record.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// A delivery record already exists; records are written once.
    #[error("order has already been delivered")]
    AlreadyDelivered,

    /// Only email orders are fulfilled by sending a payload.
    #[error("orders with delivery method {0} are not delivered by payload")]
    UnsupportedMethod(DeliveryMethod),

    /// The order was cancelled or refunded.
    #[error("order is {0} and can no longer be delivered")]
    OrderClosed(OrderStatus),
}

/// Check whether a delivery record may be written for an order.
///
/// A retried delivery is reported as [`DeliveryError::AlreadyDelivered`]
/// regardless of the order's current status.
///
/// # Errors
///
/// Returns the first [`DeliveryError`] that applies.
pub fn ensure_deliverable(
    status: OrderStatus,
    method: DeliveryMethod,
    already_delivered: bool,
) -> Result<(), DeliveryError> {
    if already_delivered {
        return Err(DeliveryError::AlreadyDelivered);
    }

    if method != DeliveryMethod::Email {
        return Err(DeliveryError::UnsupportedMethod(method));
    }

    match status {
        OrderStatus::Cancelled | OrderStatus::Refunded => Err(DeliveryError::OrderClosed(status)),
        OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Completed => Ok(()),
    }
}
