//! Orders service.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use mockall::automock;
use storefront::prelude::{OrderStatus, OrderTotals, PaymentStatus, ensure_deliverable};
use tracing::{error, info};

use crate::{
    database::{RetryPolicy, Store, now, retry_on_conflict},
    domain::{
        orders::{
            data::{NewOrder, OrderCursor, OrderFilter, OrderPage, PageRequest},
            errors::OrdersServiceError,
            records::{DeliveryPayload, DeliveryRecord, OrderLine, OrderRecord, OrderUuid},
            repository::OrdersRepository as _,
        },
        users::UserId,
        validation::{ValidationError, required},
    },
    payments::{PaymentGateway, PaymentOutcome, PaymentRequest},
};

#[derive(Clone)]
pub struct StoreOrdersService {
    store: Arc<dyn Store>,
    payments: Arc<dyn PaymentGateway>,
    retry: RetryPolicy,
}

impl StoreOrdersService {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentGateway>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            payments,
            retry,
        }
    }

    /// Validate checkout input and price it. Nothing is persisted.
    fn prepare_order(order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let user_id = UserId::parse(&order.user_id)?;
        let currency = required("currency", &order.currency)?;
        let payment_method = required("payment method", &order.payment_method)?;
        let delivery_email = required("delivery email", &order.delivery_email)?;

        let totals = OrderTotals::compute(
            order.items.iter().map(OrderLine::amount),
            order.tax,
            order.discount,
        )
        .map_err(ValidationError::from)?;

        let uuid = OrderUuid::new();
        let created_at = now();

        Ok(OrderRecord {
            uuid,
            order_number: OrderRecord::order_number_for(uuid, created_at),
            user_id,
            items: order.items,
            totals,
            currency: currency.to_ascii_uppercase(),
            status: OrderStatus::INITIAL,
            payment_status: PaymentStatus::Pending,
            payment_method,
            payment_id: None,
            billing_address: order.billing_address,
            delivery_method: order.delivery_method,
            delivery_email,
            notes: order
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            delivery: None,
            created_at,
            updated_at: created_at,
        })
    }

    async fn persist_order(&self, order: &OrderRecord) -> Result<(), OrdersServiceError> {
        retry_on_conflict(self.retry, move || self.try_create_order(order)).await
    }

    async fn try_create_order(&self, order: &OrderRecord) -> Result<(), OrdersServiceError> {
        let mut tx = self.store.begin().await?;

        tx.create_order(order).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn try_get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .get_order(order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        tx.commit().await?;

        Ok(order)
    }

    async fn try_update_order_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.store.begin().await?;

        let mut updated = tx
            .get_order(order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        updated.status = updated.status.transition_to(status)?;
        updated.updated_at = now();

        if !tx
            .update_order_status(order, updated.status, updated.updated_at)
            .await?
        {
            return Err(OrdersServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn try_add_order_delivery_info(
        &self,
        order: OrderUuid,
        payload: &DeliveryPayload,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.store.begin().await?;

        let mut updated = tx
            .get_order(order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        ensure_deliverable(
            updated.status,
            updated.delivery_method,
            updated.delivery.is_some(),
        )?;

        let delivery = DeliveryRecord {
            sent_at: now(),
            payload: payload.clone(),
        };

        if !tx
            .record_delivery(order, &delivery, OrderStatus::Completed)
            .await?
        {
            return Err(OrdersServiceError::AlreadyDelivered);
        }

        tx.commit().await?;

        updated.status = OrderStatus::Completed;
        updated.updated_at = delivery.sent_at;
        updated.delivery = Some(delivery);

        Ok(updated)
    }

    async fn try_list_orders(
        &self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.store.begin().await?;

        let orders = tx.list_orders(filter, after, limit).await?;

        tx.commit().await?;

        Ok(orders)
    }
}

impl Debug for StoreOrdersService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StoreOrdersService")
            .field("store", &self.store)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OrdersService for StoreOrdersService {
    #[tracing::instrument(skip(self, order))]
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let order = Self::prepare_order(order)?;

        self.persist_order(&order).await?;

        info!(
            order_uuid = %order.uuid,
            order_number = %order.order_number,
            user_id = %order.user_id,
            total = order.totals.total,
            "created order"
        );

        Ok(order)
    }

    #[tracing::instrument(skip(self, order))]
    async fn checkout(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let mut order = Self::prepare_order(order)?;

        let outcome = self
            .payments
            .authorize_payment(PaymentRequest {
                amount: order.totals.total,
                currency: order.currency.clone(),
                payment_method: order.payment_method.clone(),
                description: format!("Order {}", order.order_number),
            })
            .await?;

        let payment_id = match outcome {
            PaymentOutcome::Approved { payment_id } => payment_id,
            PaymentOutcome::Declined { reason } => {
                info!(order_number = %order.order_number, %reason, "payment declined");

                return Err(OrdersServiceError::PaymentDeclined { reason });
            }
        };

        order.payment_status = PaymentStatus::Paid;
        order.payment_id = Some(payment_id);

        if let Err(source) = self.persist_order(&order).await {
            error!(
                order_number = %order.order_number,
                payment_id = ?order.payment_id,
                "payment captured but order was not stored: {source}"
            );

            return Err(source);
        }

        info!(
            order_uuid = %order.uuid,
            order_number = %order.order_number,
            user_id = %order.user_id,
            total = order.totals.total,
            "checked out order"
        );

        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        retry_on_conflict(self.retry, move || self.try_get_order(order)).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_orders(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<OrderPage, OrdersServiceError> {
        let (limit, after) = page.validate()?;
        let filter = &filter;

        let orders = retry_on_conflict(self.retry, move || {
            self.try_list_orders(filter, after, limit)
        })
        .await?;

        let next_cursor = if orders.len() == limit {
            orders.last().map(|last| OrderCursor::after(last).encode())
        } else {
            None
        };

        Ok(OrderPage {
            orders,
            next_cursor,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn update_order_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let updated = retry_on_conflict(self.retry, move || {
            self.try_update_order_status(order, status)
        })
        .await?;

        info!(order_uuid = %order, %status, "updated order status");

        Ok(updated)
    }

    #[tracing::instrument(skip(self, payload))]
    async fn add_order_delivery_info(
        &self,
        order: OrderUuid,
        payload: DeliveryPayload,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if payload.is_blank() {
            return Err(ValidationError::Missing("delivery payload").into());
        }

        let payload = &payload;

        let delivered = retry_on_conflict(self.retry, move || {
            self.try_add_order_delivery_info(order, payload)
        })
        .await?;

        info!(
            order_uuid = %order,
            delivery_email = %delivered.delivery_email,
            "recorded order delivery"
        );

        Ok(delivered)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Creates a `pending` order with `pending` payment from a cart snapshot.
    ///
    /// Totals are computed from the items, tax and discount.
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    /// Charges the order total through the payment gateway and stores the
    /// order as paid. A declined payment stores nothing.
    async fn checkout(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    /// Orders matching `filter`, newest first, one page at a time.
    async fn list_orders(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<OrderPage, OrdersServiceError>;

    /// Moves an order along its lifecycle.
    async fn update_order_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Records digital delivery once and completes the order.
    async fn add_order_delivery_info(
        &self,
        order: OrderUuid,
        payload: DeliveryPayload,
    ) -> Result<OrderRecord, OrdersServiceError>;
}
