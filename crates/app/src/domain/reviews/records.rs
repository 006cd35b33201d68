//! Review Records

use jiff::Timestamp;
use storefront::prelude::Rating;

use crate::{
    domain::{products::records::ProductUuid, users::UserId},
    uuids::TypedUuid,
};

/// Review UUID
pub type ReviewUuid = TypedUuid<ReviewRecord>;

/// Review Record
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub uuid: ReviewUuid,
    pub user_id: UserId,
    pub product_uuid: ProductUuid,
    pub rating: Rating,
    pub title: String,
    pub content: String,
    pub is_approved: bool,
    pub helpful_count: u64,
    pub admin_response: Option<AdminResponse>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminResponse {
    pub content: String,
    pub responded_at: Timestamp,
}
