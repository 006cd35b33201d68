//! Orders Data

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64};
use jiff::Timestamp;
use storefront::prelude::{DeliveryMethod, OrderStatus, PaymentStatus};

use crate::domain::{
    orders::records::{Address, OrderLine, OrderRecord, OrderUuid},
    users::UserId,
    validation::ValidationError,
};

/// Checkout input: a snapshot of the cart plus billing and delivery details.
///
/// Carries no total; totals are always derived from the items.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<OrderLine>,
    pub tax: u64,
    pub discount: u64,
    pub currency: String,
    pub payment_method: String,
    pub billing_address: Address,
    pub delivery_method: DeliveryMethod,
    pub delivery_email: String,
    pub notes: Option<String>,
}

/// Equality filters and an inclusive creation window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub user_id: Option<UserId>,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
}

impl OrderFilter {
    #[must_use]
    pub fn matches(&self, order: &OrderRecord) -> bool {
        self.status.is_none_or(|status| order.status == status)
            && self
                .payment_status
                .is_none_or(|status| order.payment_status == status)
            && self
                .user_id
                .as_ref()
                .is_none_or(|user| &order.user_id == user)
            && self.created_from.is_none_or(|from| order.created_at >= from)
            && self.created_to.is_none_or(|to| order.created_at <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;

    /// Validate the limit and decode the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PageLimit`] or [`ValidationError::Cursor`].
    pub fn validate(&self) -> Result<(usize, Option<OrderCursor>), ValidationError> {
        if !(1..=Self::MAX_LIMIT).contains(&self.limit) {
            return Err(ValidationError::PageLimit {
                requested: self.limit,
                max: Self::MAX_LIMIT,
            });
        }

        let cursor = self.cursor.as_deref().map(OrderCursor::decode).transpose()?;

        Ok((self.limit, cursor))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            cursor: None,
        }
    }
}

/// Position of the last order on a page, in `created_at desc, uuid desc`
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCursor {
    pub created_at: Timestamp,
    pub uuid: OrderUuid,
}

impl OrderCursor {
    #[must_use]
    pub fn after(order: &OrderRecord) -> Self {
        Self {
            created_at: order.created_at,
            uuid: order.uuid,
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        BASE64.encode(format!("{}|{}", self.created_at, self.uuid))
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::Cursor`] for anything [`Self::encode`]
    /// could not have produced.
    pub fn decode(value: &str) -> Result<Self, ValidationError> {
        let bytes = BASE64.decode(value).map_err(|_| ValidationError::Cursor)?;
        let text = String::from_utf8(bytes).map_err(|_| ValidationError::Cursor)?;
        let (created_at, uuid) = text.split_once('|').ok_or(ValidationError::Cursor)?;

        Ok(Self {
            created_at: created_at.parse().map_err(|_| ValidationError::Cursor)?,
            uuid: uuid.parse().map_err(|_| ValidationError::Cursor)?,
        })
    }

    /// Whether `order` sorts strictly after this cursor.
    #[must_use]
    pub fn precedes(&self, order: &OrderRecord) -> bool {
        (order.created_at, order.uuid) < (self.created_at, self.uuid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<OrderRecord>,
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn cursor_survives_encoding() -> TestResult {
        let cursor = OrderCursor {
            created_at: "2026-10-17T09:30:00.123456Z".parse()?,
            uuid: OrderUuid::new(),
        };

        assert_eq!(OrderCursor::decode(&cursor.encode())?, cursor);

        Ok(())
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        assert_eq!(
            OrderCursor::decode("not a cursor"),
            Err(ValidationError::Cursor)
        );
        assert_eq!(
            OrderCursor::decode(&BASE64.encode("2026-10-17T09:30:00Z")),
            Err(ValidationError::Cursor)
        );
    }

    #[test]
    fn page_limit_is_bounded() {
        for limit in [0, 101] {
            let page = PageRequest {
                limit,
                cursor: None,
            };

            assert_eq!(
                page.validate(),
                Err(ValidationError::PageLimit {
                    requested: limit,
                    max: 100
                })
            );
        }
    }

    #[test]
    fn default_page_has_ten_rows() -> TestResult {
        assert_eq!(PageRequest::default().validate()?, (10, None));

        Ok(())
    }
}
