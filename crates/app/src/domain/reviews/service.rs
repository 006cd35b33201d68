//! Reviews service.
//!
//! Every mutation rewrites the product's rating aggregate in the same store
//! transaction as the review itself. Adding a review folds the new rating
//! into the stored aggregate; editing a rating or deleting a review
//! recomputes it from the remaining reviews.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use storefront::prelude::{Rating, RatingSummary};
use tracing::{info, warn};

use crate::{
    database::{RetryPolicy, Store, StoreTransaction, now, retry_on_conflict},
    domain::{
        products::{records::ProductUuid, repository::ProductsRepository as _},
        reviews::{
            data::{NewReview, ReviewPatch},
            errors::ReviewsServiceError,
            records::{AdminResponse, ReviewRecord, ReviewUuid},
            repository::ReviewsRepository as _,
        },
        users::UserId,
        validation::ValidationError,
    },
};

/// Drift below this is floating point noise, not a stale aggregate.
const RATING_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct StoreReviewsService {
    store: Arc<dyn Store>,
    retry: RetryPolicy,
}

impl StoreReviewsService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    async fn try_add_review(
        &self,
        review: &ReviewRecord,
    ) -> Result<RatingSummary, ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let product = tx
            .get_product(review.product_uuid)
            .await?
            .ok_or(ReviewsServiceError::ProductNotFound)?;

        if tx
            .find_user_product_review(&review.user_id, review.product_uuid)
            .await?
            .is_some()
        {
            return Err(ReviewsServiceError::DuplicateReview);
        }

        tx.create_review(review).await?;

        let rating = product.rating.with_added(review.rating);

        tx.update_product_rating(review.product_uuid, rating, review.created_at)
            .await?;

        tx.commit().await?;

        Ok(rating)
    }

    async fn try_update_review(
        &self,
        review: ReviewUuid,
        patch: &ReviewPatch,
        rating: Option<Rating>,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let mut updated = tx
            .get_review(review)
            .await?
            .ok_or(ReviewsServiceError::NotFound)?;

        let updated_at = now();

        if let Some(rating) = rating {
            updated.rating = rating;
        }

        if let Some(title) = &patch.title {
            updated.title.clone_from(title);
        }

        if let Some(content) = &patch.content {
            updated.content.clone_from(content);
        }

        if let Some(is_approved) = patch.is_approved {
            updated.is_approved = is_approved;
        }

        if let Some(response) = &patch.admin_response {
            updated.admin_response = Some(AdminResponse {
                content: response.clone(),
                responded_at: updated_at,
            });
        }

        updated.updated_at = updated_at;

        if !tx.update_review(&updated).await? {
            return Err(ReviewsServiceError::NotFound);
        }

        if rating.is_some() {
            recompute_rating(&mut *tx, updated.product_uuid).await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn try_delete_review(
        &self,
        review: ReviewUuid,
    ) -> Result<(ProductUuid, RatingSummary), ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let existing = tx
            .get_review(review)
            .await?
            .ok_or(ReviewsServiceError::NotFound)?;

        if !tx.delete_review(review).await? {
            return Err(ReviewsServiceError::NotFound);
        }

        let rating = recompute_rating(&mut *tx, existing.product_uuid).await?;

        tx.commit().await?;

        Ok((existing.product_uuid, rating))
    }

    async fn try_get_review(&self, review: ReviewUuid) -> Result<ReviewRecord, ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let review = tx
            .get_review(review)
            .await?
            .ok_or(ReviewsServiceError::NotFound)?;

        tx.commit().await?;

        Ok(review)
    }

    async fn try_get_user_product_review(
        &self,
        user: &UserId,
        product: ProductUuid,
    ) -> Result<Option<ReviewRecord>, ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let review = tx.find_user_product_review(user, product).await?;

        tx.commit().await?;

        Ok(review)
    }

    async fn try_get_product_reviews(
        &self,
        product: ProductUuid,
        approved_only: bool,
    ) -> Result<Vec<ReviewRecord>, ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let reviews = tx.list_product_reviews(product, approved_only).await?;

        tx.commit().await?;

        Ok(reviews)
    }

    async fn try_mark_review_helpful(
        &self,
        review: ReviewUuid,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let mut updated = tx
            .get_review(review)
            .await?
            .ok_or(ReviewsServiceError::NotFound)?;

        updated.helpful_count = updated.helpful_count.saturating_add(1);
        updated.updated_at = now();

        if !tx.update_review(&updated).await? {
            return Err(ReviewsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn try_recalculate_product_rating(
        &self,
        product: ProductUuid,
    ) -> Result<(RatingSummary, RatingSummary), ReviewsServiceError> {
        let mut tx = self.store.begin().await?;

        let stored = tx
            .get_product(product)
            .await?
            .ok_or(ReviewsServiceError::ProductNotFound)?
            .rating;

        let rating = recompute_rating(&mut *tx, product).await?;

        tx.commit().await?;

        Ok((stored, rating))
    }
}

/// Rebuild a product's aggregate from all of its reviews and store it.
async fn recompute_rating<T: StoreTransaction + ?Sized>(
    tx: &mut T,
    product: ProductUuid,
) -> Result<RatingSummary, ReviewsServiceError> {
    let rating = RatingSummary::from_ratings(tx.product_ratings(product).await?);

    if !tx.update_product_rating(product, rating, now()).await? {
        return Err(ReviewsServiceError::ProductNotFound);
    }

    Ok(rating)
}

fn validate_rating(rating: i64) -> Result<Rating, ReviewsServiceError> {
    Rating::try_from(rating)
        .map_err(ValidationError::from)
        .map_err(ReviewsServiceError::from)
}

#[async_trait]
impl ReviewsService for StoreReviewsService {
    #[tracing::instrument(skip(self, review), fields(product_uuid = %review.product_uuid))]
    async fn add_review(&self, review: NewReview) -> Result<ReviewRecord, ReviewsServiceError> {
        let created_at = now();

        let record = ReviewRecord {
            uuid: ReviewUuid::new(),
            user_id: UserId::parse(&review.user_id)?,
            product_uuid: review.product_uuid,
            rating: validate_rating(review.rating)?,
            title: review.title.trim().to_string(),
            content: review.content.trim().to_string(),
            is_approved: false,
            helpful_count: 0,
            admin_response: None,
            created_at,
            updated_at: created_at,
        };

        let created = &record;

        let rating = retry_on_conflict(self.retry, move || self.try_add_review(created)).await?;

        info!(
            review_uuid = %record.uuid,
            rating = record.rating.value(),
            average = rating.average,
            count = rating.count,
            "added review"
        );

        Ok(record)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_review(
        &self,
        review: ReviewUuid,
        patch: ReviewPatch,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        let rating = patch.rating.map(validate_rating).transpose()?;
        let patch = &patch;

        let updated = retry_on_conflict(self.retry, move || {
            self.try_update_review(review, patch, rating)
        })
        .await?;

        info!(
            review_uuid = %review,
            rating_changed = rating.is_some(),
            "updated review"
        );

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_review(&self, review: ReviewUuid) -> Result<(), ReviewsServiceError> {
        let (product, rating) =
            retry_on_conflict(self.retry, move || self.try_delete_review(review)).await?;

        info!(
            review_uuid = %review,
            product_uuid = %product,
            average = rating.average,
            count = rating.count,
            "deleted review"
        );

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_review(&self, review: ReviewUuid) -> Result<ReviewRecord, ReviewsServiceError> {
        retry_on_conflict(self.retry, move || self.try_get_review(review)).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_user_product_review(
        &self,
        user: UserId,
        product: ProductUuid,
    ) -> Result<Option<ReviewRecord>, ReviewsServiceError> {
        let user = &user;

        retry_on_conflict(self.retry, move || {
            self.try_get_user_product_review(user, product)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_product_reviews(
        &self,
        product: ProductUuid,
        approved_only: bool,
    ) -> Result<Vec<ReviewRecord>, ReviewsServiceError> {
        retry_on_conflict(self.retry, move || {
            self.try_get_product_reviews(product, approved_only)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn mark_review_helpful(
        &self,
        review: ReviewUuid,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        retry_on_conflict(self.retry, move || self.try_mark_review_helpful(review)).await
    }

    #[tracing::instrument(skip(self))]
    async fn recalculate_product_rating(
        &self,
        product: ProductUuid,
    ) -> Result<RatingSummary, ReviewsServiceError> {
        let (stored, rating) = retry_on_conflict(self.retry, move || {
            self.try_recalculate_product_rating(product)
        })
        .await?;

        if !stored.approx_eq(&rating, RATING_TOLERANCE) {
            warn!(
                product_uuid = %product,
                stored_average = stored.average,
                stored_count = stored.count,
                average = rating.average,
                count = rating.count,
                "repaired stale rating aggregate"
            );
        }

        Ok(rating)
    }
}

#[automock]
#[async_trait]
pub trait ReviewsService: Send + Sync {
    /// Stores an unapproved review and folds its rating into the product's
    /// aggregate.
    async fn add_review(&self, review: NewReview) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Applies `patch`; a changed rating triggers a full recomputation of
    /// the product's aggregate.
    async fn update_review(
        &self,
        review: ReviewUuid,
        patch: ReviewPatch,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Removes a review and recomputes the product's aggregate from the rest.
    async fn delete_review(&self, review: ReviewUuid) -> Result<(), ReviewsServiceError>;

    async fn get_review(&self, review: ReviewUuid) -> Result<ReviewRecord, ReviewsServiceError>;

    /// The user's review of a product, if they wrote one.
    async fn get_user_product_review(
        &self,
        user: UserId,
        product: ProductUuid,
    ) -> Result<Option<ReviewRecord>, ReviewsServiceError>;

    /// A product's reviews, newest first.
    async fn get_product_reviews(
        &self,
        product: ProductUuid,
        approved_only: bool,
    ) -> Result<Vec<ReviewRecord>, ReviewsServiceError>;

    async fn mark_review_helpful(
        &self,
        review: ReviewUuid,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Rebuilds the product's aggregate from its reviews and returns it.
    async fn recalculate_product_rating(
        &self,
        product: ProductUuid,
    ) -> Result<RatingSummary, ReviewsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use storefront::prelude::RatingError;
    use testresult::TestResult;

    use crate::{
        database::{MemoryFault, StoreError},
        domain::products::ProductsService,
        test::TestContext,
    };

    use super::*;

    async fn rating_of<S>(
        ctx: &TestContext<S>,
        product: ProductUuid,
    ) -> TestResult<RatingSummary> {
        Ok(ctx.products.get_product(product).await?.rating)
    }

    #[tokio::test]
    async fn add_then_delete_keeps_aggregate_in_step() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Disney+ Annual", 7_999).await?.uuid;

        let five = ctx.add_review("user-a", product, 5).await?;
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 5.0, count: 1 });

        ctx.add_review("user-b", product, 3).await?;
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 4.0, count: 2 });

        ctx.reviews.delete_review(five.uuid).await?;
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 3.0, count: 1 });

        Ok(())
    }

    #[tokio::test]
    async fn deleting_last_review_resets_aggregate() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Xbox Game Pass", 1_499).await?.uuid;

        let review = ctx.add_review("user-a", product, 4).await?;

        ctx.reviews.delete_review(review.uuid).await?;

        assert_eq!(rating_of(&ctx, product).await?, RatingSummary::EMPTY);

        Ok(())
    }

    #[tokio::test]
    async fn new_review_is_unapproved_with_no_helpful_votes() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Office 365", 6_999).await?.uuid;

        let review = ctx.add_review("user-a", product, 4).await?;

        assert!(!review.is_approved);
        assert_eq!(review.helpful_count, 0);
        assert!(review.admin_response.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_review_is_rejected_and_aggregate_unchanged() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("YouTube Premium", 1_199).await?.uuid;

        ctx.add_review("user-a", product, 5).await?;
        let before = rating_of(&ctx, product).await?;

        let result = ctx.add_review("user-a", product, 1).await;

        assert!(
            matches!(result, Err(ReviewsServiceError::DuplicateReview)),
            "expected DuplicateReview, got {result:?}"
        );
        assert_eq!(rating_of(&ctx, product).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Canva Pro", 1_299).await?.uuid;

        for rating in [0, 6, -1] {
            let result = ctx.add_review("user-a", product, rating).await;

            assert!(
                matches!(
                    result,
                    Err(ReviewsServiceError::Validation(ValidationError::Rating(
                        RatingError::OutOfRange(value)
                    ))) if value == rating
                ),
                "expected OutOfRange({rating}), got {result:?}"
            );
        }

        assert_eq!(rating_of(&ctx, product).await?, RatingSummary::EMPTY);

        Ok(())
    }

    #[tokio::test]
    async fn blank_user_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Adobe CC", 5_499).await?.uuid;

        let result = ctx.add_review("  ", product, 3).await;

        assert!(
            matches!(
                result,
                Err(ReviewsServiceError::Validation(ValidationError::Missing(_)))
            ),
            "expected Missing, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn review_for_unknown_product_is_rejected() {
        let ctx = TestContext::new();

        let result = ctx.add_review("user-a", ProductUuid::new(), 3).await;

        assert!(
            matches!(result, Err(ReviewsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn rating_change_recomputes_aggregate() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("HBO Max", 1_599).await?.uuid;

        let review = ctx.add_review("user-a", product, 2).await?;
        ctx.add_review("user-b", product, 4).await?;

        let updated = ctx
            .reviews
            .update_review(
                review.uuid,
                ReviewPatch {
                    rating: Some(5),
                    ..ReviewPatch::default()
                },
            )
            .await?;

        assert_eq!(updated.rating.value(), 5);
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 4.5, count: 2 });

        Ok(())
    }

    #[tokio::test]
    async fn moderation_update_leaves_aggregate_alone() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("NordVPN", 4_999).await?.uuid;

        let review = ctx.add_review("user-a", product, 3).await?;
        let before = rating_of(&ctx, product).await?;

        let updated = ctx
            .reviews
            .update_review(
                review.uuid,
                ReviewPatch {
                    is_approved: Some(true),
                    admin_response: Some("Thanks for the feedback!".to_string()),
                    title: Some("Solid".to_string()),
                    ..ReviewPatch::default()
                },
            )
            .await?;

        assert!(updated.is_approved);
        assert_eq!(updated.title, "Solid");
        assert_eq!(
            updated.admin_response.map(|response| response.content),
            Some("Thanks for the feedback!".to_string())
        );
        assert_eq!(rating_of(&ctx, product).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn update_with_invalid_rating_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Duolingo Plus", 899).await?.uuid;
        let review = ctx.add_review("user-a", product, 3).await?;

        let result = ctx
            .reviews
            .update_review(
                review.uuid,
                ReviewPatch {
                    rating: Some(9),
                    ..ReviewPatch::default()
                },
            )
            .await;

        assert!(
            matches!(result, Err(ReviewsServiceError::Validation(_))),
            "expected Validation, got {result:?}"
        );
        assert_eq!(ctx.reviews.get_review(review.uuid).await?.rating.value(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_unknown_review_return_not_found() {
        let ctx = TestContext::new();

        let updated = ctx
            .reviews
            .update_review(ReviewUuid::new(), ReviewPatch::default())
            .await;

        assert!(
            matches!(updated, Err(ReviewsServiceError::NotFound)),
            "expected NotFound, got {updated:?}"
        );

        let deleted = ctx.reviews.delete_review(ReviewUuid::new()).await;

        assert!(
            matches!(deleted, Err(ReviewsServiceError::NotFound)),
            "expected NotFound, got {deleted:?}"
        );
    }

    #[tokio::test]
    async fn product_reviews_are_newest_first_and_filterable() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Grammarly", 2_999).await?.uuid;

        let first = ctx.add_review("user-a", product, 4).await?;
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = ctx.add_review("user-b", product, 2).await?;

        ctx.reviews
            .update_review(
                first.uuid,
                ReviewPatch {
                    is_approved: Some(true),
                    ..ReviewPatch::default()
                },
            )
            .await?;

        let all: Vec<ReviewUuid> = ctx
            .reviews
            .get_product_reviews(product, false)
            .await?
            .iter()
            .map(|review| review.uuid)
            .collect();

        assert_eq!(all, vec![second.uuid, first.uuid]);

        let approved: Vec<ReviewUuid> = ctx
            .reviews
            .get_product_reviews(product, true)
            .await?
            .iter()
            .map(|review| review.uuid)
            .collect();

        assert_eq!(approved, vec![first.uuid]);

        Ok(())
    }

    #[tokio::test]
    async fn user_product_review_lookup() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Audible", 1_495).await?.uuid;
        let review = ctx.add_review("user-a", product, 5).await?;

        let found = ctx
            .reviews
            .get_user_product_review(UserId::parse("user-a")?, product)
            .await?;

        assert_eq!(found.map(|r| r.uuid), Some(review.uuid));

        let missing = ctx
            .reviews
            .get_user_product_review(UserId::parse("user-b")?, product)
            .await?;

        assert!(missing.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn mark_helpful_increments_count() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Dropbox Plus", 1_199).await?.uuid;
        let review = ctx.add_review("user-a", product, 5).await?;

        ctx.reviews.mark_review_helpful(review.uuid).await?;
        let updated = ctx.reviews.mark_review_helpful(review.uuid).await?;

        assert_eq!(updated.helpful_count, 2);

        Ok(())
    }

    #[tokio::test]
    async fn recalculate_matches_review_set() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("1Password", 3_599).await?.uuid;

        ctx.add_review("user-a", product, 1).await?;
        ctx.add_review("user-b", product, 2).await?;
        ctx.add_review("user-c", product, 2).await?;

        let rating = ctx.reviews.recalculate_product_rating(product).await?;

        assert!(rating.approx_eq(
            &RatingSummary {
                average: 5.0 / 3.0,
                count: 3
            },
            1e-9
        ));
        assert!(rating.approx_eq(&rating_of(&ctx, product).await?, 1e-9));

        Ok(())
    }

    #[tokio::test]
    async fn recalculate_unknown_product_is_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .reviews
            .recalculate_product_rating(ProductUuid::new())
            .await;

        assert!(
            matches!(result, Err(ReviewsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn failed_commit_leaves_reviews_and_aggregate_unchanged() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Notion Plus", 960).await?.uuid;
        let kept = ctx.add_review("user-a", product, 5).await?;
        let before = rating_of(&ctx, product).await?;

        ctx.store.fail_next_commits(MemoryFault::Unavailable, 1).await;

        let added = ctx.add_review("user-b", product, 1).await;

        assert!(
            matches!(
                added,
                Err(ReviewsServiceError::Unavailable(StoreError::Unavailable(_)))
            ),
            "expected Unavailable, got {added:?}"
        );

        ctx.store.fail_next_commits(MemoryFault::Unavailable, 1).await;

        let deleted = ctx.reviews.delete_review(kept.uuid).await;

        assert!(
            matches!(deleted, Err(ReviewsServiceError::Unavailable(_))),
            "expected Unavailable, got {deleted:?}"
        );

        let reviews = ctx.reviews.get_product_reviews(product, false).await?;

        assert_eq!(reviews, vec![kept]);
        assert_eq!(rating_of(&ctx, product).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn conflicting_commit_is_retried() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Evernote", 1_499).await?.uuid;

        ctx.store.fail_next_commits(MemoryFault::Conflict, 2).await;

        ctx.add_review("user-a", product, 4).await?;

        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 4.0, count: 1 });
        assert_eq!(ctx.reviews.get_product_reviews(product, false).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn aggregate_tracks_many_mutations() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Crunchyroll", 799).await?.uuid;

        let mut kept = Vec::new();

        for (index, stars) in [5, 1, 4, 4, 2, 3, 5, 1, 2].into_iter().enumerate() {
            let review = ctx.add_review(&format!("user-{index}"), product, stars).await?;

            if index % 3 == 0 {
                ctx.reviews.delete_review(review.uuid).await?;
            } else {
                kept.push(review.rating);
            }
        }

        assert!(
            rating_of(&ctx, product)
                .await?
                .approx_eq(&RatingSummary::from_ratings(kept), 1e-9)
        );

        Ok(())
    }

    #[tokio::test]
    async fn aggregate_follows_add_update_delete_in_postgres() -> TestResult {
        let ctx = TestContext::postgres().await;
        let product = ctx.create_product("Spotify Premium", 1_099).await?.uuid;

        let five = ctx.add_review("user-a", product, 5).await?;
        let three = ctx.add_review("user-b", product, 3).await?;
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 4.0, count: 2 });

        ctx.reviews
            .update_review(
                three.uuid,
                ReviewPatch {
                    rating: Some(4),
                    ..ReviewPatch::default()
                },
            )
            .await?;
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 4.5, count: 2 });

        ctx.reviews.delete_review(five.uuid).await?;
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary { average: 4.0, count: 1 });

        ctx.reviews.delete_review(three.uuid).await?;
        assert_eq!(rating_of(&ctx, product).await?, RatingSummary::EMPTY);

        ctx.cleanup().await;

        Ok(())
    }

    #[tokio::test]
    async fn moderated_review_reads_back_in_postgres() -> TestResult {
        let ctx = TestContext::postgres().await;
        let product = ctx.create_product("Canva Pro", 1_299).await?.uuid;
        let review = ctx.add_review("user-a", product, 4).await?;

        let moderated = ctx
            .reviews
            .update_review(
                review.uuid,
                ReviewPatch {
                    is_approved: Some(true),
                    admin_response: Some("Thanks for the feedback".to_string()),
                    ..ReviewPatch::default()
                },
            )
            .await?;
        let helpful = ctx.reviews.mark_review_helpful(review.uuid).await?;

        assert_eq!(ctx.reviews.get_review(review.uuid).await?, helpful);
        assert_eq!(helpful.helpful_count, 1);
        assert_eq!(helpful.admin_response, moderated.admin_response);
        assert_eq!(
            ctx.reviews
                .get_user_product_review(UserId::parse("user-a")?, product)
                .await?,
            helpful
        );
        assert_eq!(ctx.reviews.get_product_reviews(product, true).await?, vec![helpful]);

        ctx.cleanup().await;

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_review_is_rejected_in_postgres() -> TestResult {
        let ctx = TestContext::postgres().await;
        let product = ctx.create_product("Duolingo Super", 699).await?.uuid;

        ctx.add_review("user-a", product, 5).await?;
        let before = rating_of(&ctx, product).await?;

        let result = ctx.add_review("user-a", product, 1).await;

        assert!(
            matches!(result, Err(ReviewsServiceError::DuplicateReview)),
            "expected DuplicateReview, got {result:?}"
        );
        assert_eq!(rating_of(&ctx, product).await?, before);
        assert_eq!(ctx.reviews.get_product_reviews(product, false).await?.len(), 1);

        ctx.cleanup().await;

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reviews_keep_aggregate_exact_in_postgres() -> TestResult {
        let ctx = TestContext::postgres().await;
        let product = ctx.create_product("Adobe Creative Cloud", 5_499).await?.uuid;

        let handles: Vec<_> = (0..8_i64)
            .map(|index| {
                let reviews = ctx.reviews.clone();

                tokio::spawn(async move {
                    reviews
                        .add_review(NewReview {
                            user_id: format!("user-{index}"),
                            product_uuid: product,
                            rating: index % 5 + 1,
                            title: "Review".to_string(),
                            content: "Concurrent".to_string(),
                        })
                        .await
                })
            })
            .collect();

        let mut ratings = Vec::new();

        for handle in handles {
            ratings.push(handle.await??.rating);
        }

        let expected = RatingSummary::from_ratings(ratings);
        let stored = rating_of(&ctx, product).await?;

        assert_eq!(stored.count, 8);
        assert!(stored.approx_eq(&expected, 1e-9), "stored {stored:?}, expected {expected:?}");
        assert!(
            ctx.reviews
                .recalculate_product_rating(product)
                .await?
                .approx_eq(&expected, 1e-9)
        );

        ctx.cleanup().await;

        Ok(())
    }

    #[tokio::test]
    async fn read_operations_open_spans() -> TestResult {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        use crate::{
            domain::orders::{OrdersService, records::OrderUuid},
            test::helpers::SpanNames,
        };

        let spans = SpanNames::default();
        let _guard = tracing_subscriber::registry()
            .with(spans.clone())
            .set_default();

        let ctx = TestContext::new();
        let product = ctx.create_product("Proton Unlimited", 999).await?.uuid;
        let review = ctx.add_review("user-a", product, 4).await?;

        ctx.products.get_product(product).await?;
        ctx.products.list_products().await?;
        ctx.reviews.get_review(review.uuid).await?;
        ctx.reviews
            .get_user_product_review(UserId::parse("user-a")?, product)
            .await?;
        ctx.reviews.get_product_reviews(product, false).await?;
        let _ = ctx.orders.get_order(OrderUuid::new()).await;

        for name in [
            "get_product",
            "list_products",
            "get_review",
            "get_user_product_review",
            "get_product_reviews",
            "get_order",
        ] {
            assert!(spans.contains(name), "expected a {name} span");
        }

        Ok(())
    }
}
