//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    orders::{
        DeliveryMethod, OrderStatus, PaymentStatus, UnknownVariantError,
        delivery::{DeliveryError, ensure_deliverable},
        status::TransitionError,
        totals::{LineAmount, OrderTotals, TotalsError},
    },
    rating::{Rating, RatingError, RatingSummary},
};
