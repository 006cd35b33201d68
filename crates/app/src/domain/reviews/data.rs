//! Reviews Data

use crate::domain::products::records::ProductUuid;

/// New Review Data
///
/// `rating` is unchecked; the service rejects values outside 1 to 5.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub user_id: String,
    pub product_uuid: ProductUuid,
    pub rating: i64,
    pub title: String,
    pub content: String,
}

/// Review Update Data. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_approved: Option<bool>,
    pub admin_response: Option<String>,
}
