//! In-memory backend
//!
//! Transactions are serialised behind one async mutex. Each transaction
//! works on a private copy of the data which replaces the shared copy on
//! commit, so a dropped or failed transaction leaves no trace.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use storefront::prelude::{OrderStatus, Rating, RatingSummary};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    database::{Store, StoreError, StoreTransaction},
    domain::{
        orders::{
            data::{OrderCursor, OrderFilter},
            records::{DeliveryRecord, OrderRecord, OrderUuid},
            repository::OrdersRepository,
        },
        products::{
            records::{ProductRecord, ProductUuid},
            repository::ProductsRepository,
        },
        reviews::{
            records::{ReviewRecord, ReviewUuid},
            repository::ReviewsRepository,
        },
        users::UserId,
    },
};

/// A failure to inject into an upcoming commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryFault {
    /// Fail as if a concurrent writer won.
    Conflict,

    /// Fail as if the backend went away.
    Unavailable,
}

impl From<MemoryFault> for StoreError {
    fn from(fault: MemoryFault) -> Self {
        match fault {
            MemoryFault::Conflict => Self::Conflict,
            MemoryFault::Unavailable => Self::Unavailable("injected commit failure".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryData {
    products: FxHashMap<ProductUuid, ProductRecord>,
    orders: FxHashMap<OrderUuid, OrderRecord>,
    reviews: FxHashMap<ReviewUuid, ReviewRecord>,
}

#[derive(Debug, Default)]
struct MemoryState {
    data: MemoryData,
    faults: VecDeque<MemoryFault>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` commits fail with `fault`.
    pub async fn fail_next_commits(&self, fault: MemoryFault, times: usize) {
        let mut state = self.state.lock().await;

        state.faults.extend(std::iter::repeat_n(fault, times));
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.data.clone();

        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryData,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, working } = *self;

        if let Some(fault) = guard.faults.pop_front() {
            return Err(fault.into());
        }

        guard.data = working;

        Ok(())
    }
}

fn newest_first<T>(records: &mut [T], key: impl Fn(&T) -> (Timestamp, uuid::Uuid)) {
    records.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl ProductsRepository for MemoryTransaction {
    async fn create_product(&mut self, product: &ProductRecord) -> Result<(), StoreError> {
        if self.working.products.contains_key(&product.uuid) {
            return Err(StoreError::UniqueViolation);
        }

        self.working.products.insert(product.uuid, product.clone());

        Ok(())
    }

    async fn get_product(
        &mut self,
        product: ProductUuid,
    ) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self.working.products.get(&product).cloned())
    }

    async fn list_products(&mut self) -> Result<Vec<ProductRecord>, StoreError> {
        let mut products: Vec<ProductRecord> = self.working.products.values().cloned().collect();

        newest_first(&mut products, |p| (p.created_at, p.uuid.into_uuid()));

        Ok(products)
    }

    async fn update_product_rating(
        &mut self,
        product: ProductUuid,
        rating: RatingSummary,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let Some(product) = self.working.products.get_mut(&product) else {
            return Ok(false);
        };

        product.rating = rating;
        product.updated_at = updated_at;

        Ok(true)
    }
}

#[async_trait]
impl ReviewsRepository for MemoryTransaction {
    async fn create_review(&mut self, review: &ReviewRecord) -> Result<(), StoreError> {
        if !self.working.products.contains_key(&review.product_uuid) {
            return Err(StoreError::InvalidReference);
        }

        let duplicate = self.working.reviews.contains_key(&review.uuid)
            || self.working.reviews.values().any(|existing| {
                existing.user_id == review.user_id && existing.product_uuid == review.product_uuid
            });

        if duplicate {
            return Err(StoreError::UniqueViolation);
        }

        self.working.reviews.insert(review.uuid, review.clone());

        Ok(())
    }

    async fn get_review(&mut self, review: ReviewUuid) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(self.working.reviews.get(&review).cloned())
    }

    async fn find_user_product_review(
        &mut self,
        user: &UserId,
        product: ProductUuid,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(self
            .working
            .reviews
            .values()
            .find(|review| &review.user_id == user && review.product_uuid == product)
            .cloned())
    }

    async fn update_review(&mut self, review: &ReviewRecord) -> Result<bool, StoreError> {
        let Some(existing) = self.working.reviews.get_mut(&review.uuid) else {
            return Ok(false);
        };

        existing.rating = review.rating;
        existing.title.clone_from(&review.title);
        existing.content.clone_from(&review.content);
        existing.is_approved = review.is_approved;
        existing.helpful_count = review.helpful_count;
        existing.admin_response.clone_from(&review.admin_response);
        existing.updated_at = review.updated_at;

        Ok(true)
    }

    async fn delete_review(&mut self, review: ReviewUuid) -> Result<bool, StoreError> {
        Ok(self.working.reviews.remove(&review).is_some())
    }

    async fn list_product_reviews(
        &mut self,
        product: ProductUuid,
        approved_only: bool,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut reviews: Vec<ReviewRecord> = self
            .working
            .reviews
            .values()
            .filter(|review| review.product_uuid == product)
            .filter(|review| !approved_only || review.is_approved)
            .cloned()
            .collect();

        newest_first(&mut reviews, |r| (r.created_at, r.uuid.into_uuid()));

        Ok(reviews)
    }

    async fn product_ratings(&mut self, product: ProductUuid) -> Result<Vec<Rating>, StoreError> {
        Ok(self
            .working
            .reviews
            .values()
            .filter(|review| review.product_uuid == product)
            .map(|review| review.rating)
            .collect())
    }
}

#[async_trait]
impl OrdersRepository for MemoryTransaction {
    async fn create_order(&mut self, order: &OrderRecord) -> Result<(), StoreError> {
        if self.working.orders.contains_key(&order.uuid) {
            return Err(StoreError::UniqueViolation);
        }

        self.working.orders.insert(order.uuid, order.clone());

        Ok(())
    }

    async fn get_order(&mut self, order: OrderUuid) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.working.orders.get(&order).cloned())
    }

    async fn update_order_status(
        &mut self,
        order: OrderUuid,
        status: OrderStatus,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let Some(order) = self.working.orders.get_mut(&order) else {
            return Ok(false);
        };

        order.status = status;
        order.updated_at = updated_at;

        Ok(true)
    }

    async fn record_delivery(
        &mut self,
        order: OrderUuid,
        delivery: &DeliveryRecord,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let Some(order) = self.working.orders.get_mut(&order) else {
            return Ok(false);
        };

        if order.delivery.is_some() {
            return Ok(false);
        }

        order.status = status;
        order.updated_at = delivery.sent_at;
        order.delivery = Some(delivery.clone());

        Ok(true)
    }

    async fn list_orders(
        &mut self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let mut orders: Vec<OrderRecord> = self
            .working
            .orders
            .values()
            .filter(|order| filter.matches(order))
            .filter(|order| after.is_none_or(|cursor| cursor.precedes(order)))
            .cloned()
            .collect();

        newest_first(&mut orders, |o| (o.created_at, o.uuid.into_uuid()));
        orders.truncate(limit);

        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn product(name: &str) -> ProductRecord {
        let now = Timestamp::now();

        ProductRecord {
            uuid: ProductUuid::new(),
            name: name.to_string(),
            price: 100,
            rating: RatingSummary::EMPTY,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn committed_writes_are_visible() -> TestResult {
        let store = MemoryStore::new();
        let product = product("Widget");

        let mut tx = store.begin().await?;
        tx.create_product(&product).await?;
        tx.commit().await?;

        let mut tx = store.begin().await?;

        assert_eq!(tx.get_product(product.uuid).await?, Some(product));

        Ok(())
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() -> TestResult {
        let store = MemoryStore::new();
        let product = product("Widget");

        {
            let mut tx = store.begin().await?;
            tx.create_product(&product).await?;
        }

        let mut tx = store.begin().await?;

        assert_eq!(tx.get_product(product.uuid).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn injected_faults_fail_commits_in_order() -> TestResult {
        let store = MemoryStore::new();
        let product = product("Widget");

        store.fail_next_commits(MemoryFault::Conflict, 1).await;
        store.fail_next_commits(MemoryFault::Unavailable, 1).await;

        let mut tx = store.begin().await?;
        tx.create_product(&product).await?;
        assert!(matches!(tx.commit().await, Err(StoreError::Conflict)));

        let mut tx = store.begin().await?;
        tx.create_product(&product).await?;
        assert!(matches!(tx.commit().await, Err(StoreError::Unavailable(_))));

        let mut tx = store.begin().await?;
        assert_eq!(tx.get_product(product.uuid).await?, None);
        tx.create_product(&product).await?;
        tx.commit().await?;

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_product_is_a_unique_violation() -> TestResult {
        let store = MemoryStore::new();
        let product = product("Widget");

        let mut tx = store.begin().await?;
        tx.create_product(&product).await?;

        assert!(matches!(
            tx.create_product(&product).await,
            Err(StoreError::UniqueViolation)
        ));

        Ok(())
    }
}
