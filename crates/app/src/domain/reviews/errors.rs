//! Reviews service errors.

use thiserror::Error;

use crate::{
    database::{Retryable, StoreError},
    domain::validation::ValidationError,
};

#[derive(Debug, Error)]
pub enum ReviewsServiceError {
    #[error("invalid review: {0}")]
    Validation(#[from] ValidationError),

    #[error("user has already reviewed this product")]
    DuplicateReview,

    #[error("review not found")]
    NotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("storage unavailable")]
    Unavailable(#[source] StoreError),
}

impl From<StoreError> for ReviewsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation => Self::DuplicateReview,
            StoreError::InvalidReference => Self::ProductNotFound,
            error => Self::Unavailable(error),
        }
    }
}

impl Retryable for ReviewsServiceError {
    fn is_conflict(&self) -> bool {
        matches!(self, Self::Unavailable(error) if error.is_conflict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_a_duplicate_review() {
        assert!(matches!(
            ReviewsServiceError::from(StoreError::UniqueViolation),
            ReviewsServiceError::DuplicateReview
        ));
    }

    #[test]
    fn dangling_product_reference_is_product_not_found() {
        assert!(matches!(
            ReviewsServiceError::from(StoreError::InvalidReference),
            ReviewsServiceError::ProductNotFound
        ));
    }

    #[test]
    fn outages_are_unavailable_and_not_retried() {
        let error = ReviewsServiceError::from(StoreError::Unavailable("down".to_string()));

        assert!(matches!(error, ReviewsServiceError::Unavailable(_)));
        assert!(!error.is_conflict());
    }
}
