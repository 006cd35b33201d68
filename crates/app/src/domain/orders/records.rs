//! Order Records

use std::fmt::{Debug, Formatter, Result as FmtResult};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use storefront::prelude::{DeliveryMethod, LineAmount, OrderStatus, OrderTotals, PaymentStatus};
use zeroize::Zeroizing;

use crate::{
    domain::{products::records::ProductUuid, users::UserId},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub order_number: String,
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub totals: OrderTotals,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub payment_id: Option<String>,
    pub billing_address: Address,
    pub delivery_method: DeliveryMethod,
    pub delivery_email: String,
    pub notes: Option<String>,
    pub delivery: Option<DeliveryRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderRecord {
    /// Human readable reference, e.g. `SF-20261017-9C4E2A11`.
    #[must_use]
    pub fn order_number_for(uuid: OrderUuid, created_at: Timestamp) -> String {
        let hex = uuid.into_uuid().simple().to_string();
        let suffix = &hex[hex.len() - 8..];

        format!(
            "SF-{}-{}",
            created_at.strftime("%Y%m%d"),
            suffix.to_ascii_uppercase()
        )
    }
}

/// A purchased product, priced at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_uuid: ProductUuid,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderLine {
    #[must_use]
    pub fn amount(&self) -> LineAmount {
        LineAmount::new(self.unit_price, self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Digital fulfilment, written once.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    pub sent_at: Timestamp,
    pub payload: DeliveryPayload,
}

/// Account credentials or license keys sent to the customer.
///
/// Wiped from memory on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct DeliveryPayload(Zeroizing<String>);

impl DeliveryPayload {
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self(Zeroizing::new(payload.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Debug for DeliveryPayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("DeliveryPayload([REDACTED])")
    }
}
