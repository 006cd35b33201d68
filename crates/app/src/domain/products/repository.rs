//! Products Repository

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};
use storefront::prelude::RatingSummary;

use crate::{
    database::{
        StoreError,
        postgres::{PgTransaction, to_db_amount, try_get_amount},
    },
    domain::products::records::{ProductRecord, ProductUuid},
};

const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const UPDATE_PRODUCT_RATING_SQL: &str = include_str!("sql/update_product_rating.sql");

/// Product persistence, available on every store transaction.
#[async_trait]
pub trait ProductsRepository: Send {
    async fn create_product(&mut self, product: &ProductRecord) -> Result<(), StoreError>;

    async fn get_product(
        &mut self,
        product: ProductUuid,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// All products, newest first.
    async fn list_products(&mut self) -> Result<Vec<ProductRecord>, StoreError>;

    /// Overwrite the stored rating aggregate. Returns `false` when the
    /// product does not exist.
    async fn update_product_rating(
        &mut self,
        product: ProductUuid,
        rating: RatingSummary,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
impl ProductsRepository for PgTransaction {
    async fn create_product(&mut self, product: &ProductRecord) -> Result<(), StoreError> {
        query(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(to_db_amount("price", product.price)?)
            .bind(product.rating.average)
            .bind(to_db_amount("rating_count", product.rating.count)?)
            .bind(SqlxTimestamp::from(product.created_at))
            .bind(SqlxTimestamp::from(product.updated_at))
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn get_product(
        &mut self,
        product: ProductUuid,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let product = query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(product)
    }

    async fn list_products(&mut self) -> Result<Vec<ProductRecord>, StoreError> {
        let products = query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(products)
    }

    async fn update_product_rating(
        &mut self,
        product: ProductUuid,
        rating: RatingSummary,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let rows_affected = query(UPDATE_PRODUCT_RATING_SQL)
            .bind(product.into_uuid())
            .bind(rating.average)
            .bind(to_db_amount("rating_count", rating.count)?)
            .bind(SqlxTimestamp::from(updated_at))
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            rating: RatingSummary {
                average: row.try_get("rating_average")?,
                count: try_get_amount(row, "rating_count")?,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
