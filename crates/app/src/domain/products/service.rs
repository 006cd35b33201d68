//! Products service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use storefront::prelude::RatingSummary;
use tracing::info;

use crate::{
    database::{RetryPolicy, Store, now, retry_on_conflict},
    domain::{
        products::{
            data::NewProduct,
            errors::ProductsServiceError,
            records::{ProductRecord, ProductUuid},
            repository::ProductsRepository as _,
        },
        validation::required,
    },
};

#[derive(Debug, Clone)]
pub struct StoreProductsService {
    store: Arc<dyn Store>,
    retry: RetryPolicy,
}

impl StoreProductsService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    async fn try_create_product(&self, product: &ProductRecord) -> Result<(), ProductsServiceError> {
        let mut tx = self.store.begin().await?;

        tx.create_product(product).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn try_get_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.store.begin().await?;

        let product = tx
            .get_product(product)
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        tx.commit().await?;

        Ok(product)
    }

    async fn try_list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.store.begin().await?;

        let products = tx.list_products().await?;

        tx.commit().await?;

        Ok(products)
    }
}

#[async_trait]
impl ProductsService for StoreProductsService {
    #[tracing::instrument(skip(self, product), fields(product_uuid = %product.uuid))]
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let created_at = now();

        let record = ProductRecord {
            uuid: product.uuid,
            name: required("product name", &product.name)?,
            price: product.price,
            rating: RatingSummary::EMPTY,
            created_at,
            updated_at: created_at,
        };

        let created = &record;

        retry_on_conflict(self.retry, move || self.try_create_product(created)).await?;

        info!(product_uuid = %record.uuid, price = record.price, "created product");

        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    async fn get_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        retry_on_conflict(self.retry, move || self.try_get_product(product)).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        retry_on_conflict(self.retry, move || self.try_list_products()).await
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Creates a product with an empty rating aggregate.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Retrieves all products, newest first.
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{domain::validation::ValidationError, test::TestContext};

    use super::*;

    #[tokio::test]
    async fn create_product_starts_with_empty_rating() -> TestResult {
        let ctx = TestContext::new();
        let uuid = ProductUuid::new();

        let product = ctx
            .products
            .create_product(NewProduct {
                uuid,
                name: "Spotify Premium (12 months)".to_string(),
                price: 9_999,
            })
            .await?;

        assert_eq!(product.uuid, uuid);
        assert_eq!(product.price, 9_999);
        assert_eq!(product.rating, RatingSummary::EMPTY);

        Ok(())
    }

    #[tokio::test]
    async fn get_product_returns_created_product() -> TestResult {
        let ctx = TestContext::new();
        let created = ctx.create_product("Netflix Gift Card", 2_500).await?;

        let product = ctx.products.get_product(created.uuid).await?;

        assert_eq!(product, created);

        Ok(())
    }

    #[tokio::test]
    async fn get_product_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new();

        let result = ctx.products.get_product(ProductUuid::new()).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_product_duplicate_uuid_returns_already_exists() -> TestResult {
        let ctx = TestContext::new();
        let uuid = ProductUuid::new();

        let new_product = NewProduct {
            uuid,
            name: "Steam Wallet".to_string(),
            price: 1_000,
        };

        ctx.products.create_product(new_product.clone()).await?;

        let result = ctx.products.create_product(new_product).await;

        assert!(
            matches!(result, Err(ProductsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_product_requires_a_name() {
        let ctx = TestContext::new();

        let result = ctx
            .products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                name: "   ".to_string(),
                price: 100,
            })
            .await;

        assert!(
            matches!(
                result,
                Err(ProductsServiceError::Validation(ValidationError::Missing(
                    "product name"
                )))
            ),
            "expected missing name, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_products_returns_created_products() -> TestResult {
        let ctx = TestContext::new();

        let a = ctx.create_product("Product A", 100).await?;
        let b = ctx.create_product("Product B", 200).await?;

        let uuids: Vec<ProductUuid> = ctx
            .products
            .list_products()
            .await?
            .iter()
            .map(|p| p.uuid)
            .collect();

        assert!(uuids.contains(&a.uuid), "product A should be in the list");
        assert!(uuids.contains(&b.uuid), "product B should be in the list");

        Ok(())
    }

    #[tokio::test]
    async fn list_products_empty_when_none_created() -> TestResult {
        let ctx = TestContext::new();

        assert!(ctx.products.list_products().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn products_round_trip_through_postgres() -> TestResult {
        let ctx = TestContext::postgres().await;

        let created = ctx.create_product("Nintendo eShop Card", 3_500).await?;
        let second = ctx.create_product("PlayStation Plus", 5_999).await?;

        assert_eq!(ctx.products.get_product(created.uuid).await?, created);
        assert_eq!(ctx.products.list_products().await?, vec![second, created.clone()]);

        let duplicate = ctx
            .products
            .create_product(NewProduct {
                uuid: created.uuid,
                name: "Copy".to_string(),
                price: 1,
            })
            .await;

        assert!(
            matches!(duplicate, Err(ProductsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {duplicate:?}"
        );

        ctx.cleanup().await;

        Ok(())
    }
}
