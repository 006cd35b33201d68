//! Product Records

use jiff::Timestamp;
use storefront::prelude::RatingSummary;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Product Record
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub name: String,
    pub price: u64,
    pub rating: RatingSummary,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
