//! Reviews and product rating aggregates

pub mod data;
pub mod errors;
pub mod records;
pub mod repository;
pub mod service;

pub use errors::ReviewsServiceError;
pub use service::*;
