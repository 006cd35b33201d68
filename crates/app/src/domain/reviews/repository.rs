//! Reviews Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};
use storefront::prelude::Rating;

use crate::{
    database::{
        StoreError,
        postgres::{PgTransaction, to_db_amount, try_get_amount},
    },
    domain::{
        products::records::ProductUuid,
        reviews::records::{AdminResponse, ReviewRecord, ReviewUuid},
        users::UserId,
    },
};

const CREATE_REVIEW_SQL: &str = include_str!("sql/create_review.sql");
const GET_REVIEW_SQL: &str = include_str!("sql/get_review.sql");
const FIND_USER_PRODUCT_REVIEW_SQL: &str = include_str!("sql/find_user_product_review.sql");
const UPDATE_REVIEW_SQL: &str = include_str!("sql/update_review.sql");
const DELETE_REVIEW_SQL: &str = include_str!("sql/delete_review.sql");
const LIST_PRODUCT_REVIEWS_SQL: &str = include_str!("sql/list_product_reviews.sql");
const PRODUCT_RATINGS_SQL: &str = include_str!("sql/product_ratings.sql");

/// Review persistence, available on every store transaction.
#[async_trait]
pub trait ReviewsRepository: Send {
    /// Fails with [`StoreError::UniqueViolation`] when the user already
    /// reviewed the product and [`StoreError::InvalidReference`] when the
    /// product does not exist.
    async fn create_review(&mut self, review: &ReviewRecord) -> Result<(), StoreError>;

    async fn get_review(&mut self, review: ReviewUuid) -> Result<Option<ReviewRecord>, StoreError>;

    async fn find_user_product_review(
        &mut self,
        user: &UserId,
        product: ProductUuid,
    ) -> Result<Option<ReviewRecord>, StoreError>;

    /// Overwrite every mutable column. Returns `false` when the review does
    /// not exist.
    async fn update_review(&mut self, review: &ReviewRecord) -> Result<bool, StoreError>;

    async fn delete_review(&mut self, review: ReviewUuid) -> Result<bool, StoreError>;

    /// A product's reviews, newest first.
    async fn list_product_reviews(
        &mut self,
        product: ProductUuid,
        approved_only: bool,
    ) -> Result<Vec<ReviewRecord>, StoreError>;

    /// The rating of every review of `product`, approved or not.
    async fn product_ratings(&mut self, product: ProductUuid) -> Result<Vec<Rating>, StoreError>;
}

#[async_trait]
impl ReviewsRepository for PgTransaction {
    async fn create_review(&mut self, review: &ReviewRecord) -> Result<(), StoreError> {
        let (admin_response, admin_responded_at) = split_admin_response(review);

        query(CREATE_REVIEW_SQL)
            .bind(review.uuid.into_uuid())
            .bind(review.user_id.as_str())
            .bind(review.product_uuid.into_uuid())
            .bind(i16::from(review.rating.value()))
            .bind(&review.title)
            .bind(&review.content)
            .bind(review.is_approved)
            .bind(to_db_amount("helpful_count", review.helpful_count)?)
            .bind(admin_response)
            .bind(admin_responded_at)
            .bind(SqlxTimestamp::from(review.created_at))
            .bind(SqlxTimestamp::from(review.updated_at))
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn get_review(&mut self, review: ReviewUuid) -> Result<Option<ReviewRecord>, StoreError> {
        let review = query_as::<Postgres, ReviewRecord>(GET_REVIEW_SQL)
            .bind(review.into_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(review)
    }

    async fn find_user_product_review(
        &mut self,
        user: &UserId,
        product: ProductUuid,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let review = query_as::<Postgres, ReviewRecord>(FIND_USER_PRODUCT_REVIEW_SQL)
            .bind(user.as_str())
            .bind(product.into_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(review)
    }

    async fn update_review(&mut self, review: &ReviewRecord) -> Result<bool, StoreError> {
        let (admin_response, admin_responded_at) = split_admin_response(review);

        let rows_affected = query(UPDATE_REVIEW_SQL)
            .bind(review.uuid.into_uuid())
            .bind(i16::from(review.rating.value()))
            .bind(&review.title)
            .bind(&review.content)
            .bind(review.is_approved)
            .bind(to_db_amount("helpful_count", review.helpful_count)?)
            .bind(admin_response)
            .bind(admin_responded_at)
            .bind(SqlxTimestamp::from(review.updated_at))
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn delete_review(&mut self, review: ReviewUuid) -> Result<bool, StoreError> {
        let rows_affected = query(DELETE_REVIEW_SQL)
            .bind(review.into_uuid())
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn list_product_reviews(
        &mut self,
        product: ProductUuid,
        approved_only: bool,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let reviews = query_as::<Postgres, ReviewRecord>(LIST_PRODUCT_REVIEWS_SQL)
            .bind(product.into_uuid())
            .bind(approved_only)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(reviews)
    }

    async fn product_ratings(&mut self, product: ProductUuid) -> Result<Vec<Rating>, StoreError> {
        let ratings: Vec<i16> = query_scalar(PRODUCT_RATINGS_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut *self.tx)
            .await?;

        ratings
            .into_iter()
            .map(|rating| decode_rating(rating).map_err(StoreError::from))
            .collect()
    }
}

fn split_admin_response(review: &ReviewRecord) -> (Option<&str>, Option<SqlxTimestamp>) {
    review.admin_response.as_ref().map_or((None, None), |response| {
        (
            Some(response.content.as_str()),
            Some(SqlxTimestamp::from(response.responded_at)),
        )
    })
}

fn decode_rating(rating: i16) -> Result<Rating, sqlx::Error> {
    Rating::try_from(i64::from(rating)).map_err(|e| sqlx::Error::ColumnDecode {
        index: "rating".to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for ReviewRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let user_id: String = row.try_get("user_id")?;

        let user_id = UserId::parse(&user_id).map_err(|e| sqlx::Error::ColumnDecode {
            index: "user_id".to_string(),
            source: Box::new(e),
        })?;

        let admin_response: Option<String> = row.try_get("admin_response")?;
        let admin_responded_at: Option<SqlxTimestamp> = row.try_get("admin_responded_at")?;

        let admin_response = admin_response
            .zip(admin_responded_at)
            .map(|(content, responded_at)| AdminResponse {
                content,
                responded_at: responded_at.to_jiff(),
            });

        Ok(Self {
            uuid: ReviewUuid::from_uuid(row.try_get("uuid")?),
            user_id,
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            rating: decode_rating(row.try_get("rating")?)?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            is_approved: row.try_get("is_approved")?,
            helpful_count: try_get_amount(row, "helpful_count")?,
            admin_response,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
