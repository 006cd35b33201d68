//! Order Status

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orders::UnknownVariantError;

/// A requested status change is not in the transition table.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("order cannot move from {from} to {to}")]
pub struct TransitionError {
    /// Status the order currently holds.
    pub from: OrderStatus,

    /// Status that was requested.
    pub to: OrderStatus,
}

/// Lifecycle status of an order.
///
/// ```text
/// pending ──► processing ──► completed
///    │             │
///    └──────► cancelled ◄────┘
/// ```
///
/// `refunded` is terminal and only entered by payment reversal, which never
/// goes through [`OrderStatus::transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created at checkout, awaiting fulfilment.
    Pending,

    /// Picked up by an operator.
    Processing,

    /// Fulfilled.
    Completed,

    /// Abandoned before fulfilment.
    Cancelled,

    /// Payment reversed.
    Refunded,
}

impl OrderStatus {
    /// Status every new order starts in.
    pub const INITIAL: Self = Self::Pending;

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Whether no further transition is accepted from this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// Whether `next` is reachable from `self` in a single step.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Completed | Self::Cancelled)
        )
    }

    /// Validate a single-step transition and return the new status.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when `next` is not reachable from `self`,
    /// including when `self` is terminal or `next == self`.
    pub fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownVariantError::new("order status", other)),
        }
    }
}
