//! Products service errors.

use thiserror::Error;

use crate::{
    database::{Retryable, StoreError},
    domain::validation::ValidationError,
};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("invalid product: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage unavailable")]
    Unavailable(#[source] StoreError),
}

impl From<StoreError> for ProductsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation => Self::AlreadyExists,
            error => Self::Unavailable(error),
        }
    }
}

impl Retryable for ProductsServiceError {
    fn is_conflict(&self) -> bool {
        matches!(self, Self::Unavailable(error) if error.is_conflict())
    }
}
