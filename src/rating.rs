//! Ratings
//!
//! A product caches a [`RatingSummary`] of its reviews so listings never scan
//! the review set. Inserts update the summary incrementally; anything that
//! changes or removes an existing rating recomputes it from the full set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a [`Rating`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RatingError {
    /// Ratings are whole stars between 1 and 5.
    #[error("rating {0} is outside 1..=5")]
    OutOfRange(i64),
}

/// A single review's star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: Self = Self(1);

    /// Highest accepted rating.
    pub const MAX: Self = Self(5);

    /// Number of stars.
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(stars @ 1..=5) => Ok(Self(stars)),
            _ => Err(RatingError::OutOfRange(value)),
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Cached `{average, count}` over a product's reviews.
///
/// `average` is an unrounded mean; rounding is a presentation concern.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Arithmetic mean of all ratings, `0.0` when there are none.
    pub average: f64,

    /// Number of ratings.
    pub count: u64,
}

impl RatingSummary {
    /// Summary of a product with no reviews.
    pub const EMPTY: Self = Self {
        average: 0.0,
        count: 0,
    };

    /// Fold one more rating into the summary without rescanning.
    #[expect(
        clippy::cast_precision_loss,
        reason = "review counts stay far below 2^52"
    )]
    pub fn with_added(self, rating: Rating) -> Self {
        let count = self.count.saturating_add(1);

        let average =
            (self.average * self.count as f64 + f64::from(rating.value())) / count as f64;

        Self { average, count }
    }

    /// Recompute the summary from every rating of a product.
    #[expect(
        clippy::cast_precision_loss,
        reason = "review counts and star sums stay far below 2^52"
    )]
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_u64, 0_u64), |(sum, count), rating| {
                (sum + u64::from(rating.value()), count + 1)
            });

        if count == 0 {
            return Self::EMPTY;
        }

        Self {
            average: sum as f64 / count as f64,
            count,
        }
    }

    /// Compare two summaries, allowing `tolerance` of drift in the average.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.count == other.count && (self.average - other.average).abs() <= tolerance
    }
}
