//! App Context

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    config::AppConfig,
    database::{self, PgStore, RetryPolicy, Store},
    domain::{
        orders::{OrdersService, StoreOrdersService},
        products::{ProductsService, StoreProductsService},
        reviews::{ReviewsService, StoreReviewsService},
    },
    payments::{PaymentError, PaymentGateway},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("invalid payment gateway settings")]
    Payments(#[source] PaymentError),
}

#[derive(Clone)]
pub struct AppContext {
    pub orders: Arc<dyn OrdersService>,
    pub reviews: Arc<dyn ReviewsService>,
    pub products: Arc<dyn ProductsService>,
}

impl AppContext {
    /// Wire every service to one store.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentGateway>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            orders: Arc::new(StoreOrdersService::new(Arc::clone(&store), payments, retry)),
            reviews: Arc::new(StoreReviewsService::new(Arc::clone(&store), retry)),
            products: Arc::new(StoreProductsService::new(store, retry)),
        }
    }

    /// Build application context backed by PostgreSQL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails or
    /// the payment settings are invalid.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let payments = config.payments.gateway().map_err(AppInitError::Payments)?;

        let pool = database::connect(&config.database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        info!(
            retry_attempts = config.store.store_retry_attempts,
            approval_rate = config.payments.payment_approval_rate,
            "connected to database"
        );

        Ok(Self::new(
            Arc::new(PgStore::new(pool)),
            Arc::new(payments),
            config.store.retry_policy(),
        ))
    }
}
