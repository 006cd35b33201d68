//! Input validation errors shared by the domain services.

use storefront::prelude::{RatingError, TotalsError};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error(transparent)]
    Totals(#[from] TotalsError),

    #[error(transparent)]
    Rating(#[from] RatingError),

    #[error("page limit must be between 1 and {max}, got {requested}")]
    PageLimit { requested: usize, max: usize },

    #[error("malformed pagination cursor")]
    Cursor,
}

/// Trim `value` and reject it when nothing is left.
///
/// # Errors
///
/// Returns [`ValidationError::Missing`] naming `field` when `value` is blank.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn required_trims_surrounding_whitespace() -> TestResult {
        assert_eq!(required("name", "  Netflix Premium ")?, "Netflix Premium");

        Ok(())
    }

    #[test]
    fn required_rejects_blank_values() {
        assert_eq!(
            required("user id", " \t "),
            Err(ValidationError::Missing("user id"))
        );
    }
}
