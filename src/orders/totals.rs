//! Order Totals
//!
//! Amounts are integer minor units of the order currency.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while pricing an order.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TotalsError {
    /// An order needs at least one line.
    #[error("order has no items")]
    NoItems,

    /// Line at the given index has a zero quantity.
    #[error("item {0} has a quantity of zero")]
    ZeroQuantity(usize),

    /// An intermediate amount does not fit in `u64`.
    #[error("order amount overflowed")]
    Overflow,

    /// Discount is larger than what is being charged.
    #[error("discount {discount} exceeds subtotal plus tax {chargeable}")]
    DiscountExceedsCharge {
        /// Requested discount.
        discount: u64,

        /// Subtotal plus tax.
        chargeable: u64,
    },
}

/// The priced part of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    /// Price of one unit.
    pub unit_price: u64,

    /// Units purchased.
    pub quantity: u32,
}

impl LineAmount {
    /// Create a line amount.
    pub const fn new(unit_price: u64, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// `unit_price * quantity`, or `None` on overflow.
    pub fn extended(self) -> Option<u64> {
        self.unit_price.checked_mul(u64::from(self.quantity))
    }
}

/// Derived monetary summary of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of all extended line amounts.
    pub subtotal: u64,

    /// Tax charged on top of the subtotal.
    pub tax: u64,

    /// Discount taken off.
    pub discount: u64,

    /// `subtotal - discount + tax`.
    pub total: u64,
}

impl OrderTotals {
    /// Price an order from its lines, tax and discount.
    ///
    /// # Errors
    ///
    /// - [`TotalsError::NoItems`]: `lines` was empty.
    /// - [`TotalsError::ZeroQuantity`]: a line had no units.
    /// - [`TotalsError::Overflow`]: an amount overflowed.
    /// - [`TotalsError::DiscountExceedsCharge`]: the total would be negative.
    pub fn compute(
        lines: impl IntoIterator<Item = LineAmount>,
        tax: u64,
        discount: u64,
    ) -> Result<Self, TotalsError> {
        let mut lines = lines.into_iter().enumerate().peekable();

        if lines.peek().is_none() {
            return Err(TotalsError::NoItems);
        }

        let subtotal = lines.try_fold(0_u64, |acc, (index, line)| {
            if line.quantity == 0 {
                return Err(TotalsError::ZeroQuantity(index));
            }

            line.extended()
                .and_then(|amount| acc.checked_add(amount))
                .ok_or(TotalsError::Overflow)
        })?;

        let chargeable = subtotal.checked_add(tax).ok_or(TotalsError::Overflow)?;

        let total = chargeable
            .checked_sub(discount)
            .ok_or(TotalsError::DiscountExceedsCharge {
                discount,
                chargeable,
            })?;

        Ok(Self {
            subtotal,
            tax,
            discount,
            total,
        })
    }

    /// Whether `total == subtotal - discount + tax` holds.
    pub fn is_consistent(&self) -> bool {
        self.subtotal
            .checked_add(self.tax)
            .and_then(|chargeable| chargeable.checked_sub(self.discount))
            == Some(self.total)
    }
}
