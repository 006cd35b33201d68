//! Orders Repository

use std::{error::Error as StdError, str::FromStr};

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as, types::Json};
use storefront::prelude::{OrderStatus, OrderTotals, PaymentStatus};

use crate::{
    database::{
        StoreError,
        postgres::{PgTransaction, to_db_amount, try_get_amount},
    },
    domain::{
        orders::{
            data::{OrderCursor, OrderFilter},
            records::{
                Address, DeliveryPayload, DeliveryRecord, OrderLine, OrderRecord, OrderUuid,
            },
        },
        users::UserId,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");
const RECORD_DELIVERY_SQL: &str = include_str!("sql/record_delivery.sql");

/// Order persistence, available on every store transaction.
#[async_trait]
pub trait OrdersRepository: Send {
    async fn create_order(&mut self, order: &OrderRecord) -> Result<(), StoreError>;

    async fn get_order(&mut self, order: OrderUuid) -> Result<Option<OrderRecord>, StoreError>;

    /// Returns `false` when the order does not exist.
    async fn update_order_status(
        &mut self,
        order: OrderUuid,
        status: OrderStatus,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Attach a delivery record and move the order to `status`.
    ///
    /// Returns `false` when the order does not exist or already has a
    /// delivery record; an existing record is never overwritten.
    async fn record_delivery(
        &mut self,
        order: OrderUuid,
        delivery: &DeliveryRecord,
        status: OrderStatus,
    ) -> Result<bool, StoreError>;

    /// Up to `limit` orders matching `filter`, ordered by `created_at` then
    /// uuid, both descending, starting after `after`.
    async fn list_orders(
        &mut self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, StoreError>;
}

#[async_trait]
impl OrdersRepository for PgTransaction {
    async fn create_order(&mut self, order: &OrderRecord) -> Result<(), StoreError> {
        let delivery_sent_at = order
            .delivery
            .as_ref()
            .map(|delivery| SqlxTimestamp::from(delivery.sent_at));

        let delivery_payload = order
            .delivery
            .as_ref()
            .map(|delivery| delivery.payload.expose());

        query(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(&order.order_number)
            .bind(order.user_id.as_str())
            .bind(Json(&order.items))
            .bind(to_db_amount("subtotal", order.totals.subtotal)?)
            .bind(to_db_amount("tax", order.totals.tax)?)
            .bind(to_db_amount("discount", order.totals.discount)?)
            .bind(to_db_amount("total", order.totals.total)?)
            .bind(&order.currency)
            .bind(order.status.as_str())
            .bind(order.payment_status.as_str())
            .bind(&order.payment_method)
            .bind(order.payment_id.as_deref())
            .bind(Json(&order.billing_address))
            .bind(order.delivery_method.as_str())
            .bind(&order.delivery_email)
            .bind(order.notes.as_deref())
            .bind(delivery_sent_at)
            .bind(delivery_payload)
            .bind(SqlxTimestamp::from(order.created_at))
            .bind(SqlxTimestamp::from(order.updated_at))
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn get_order(&mut self, order: OrderUuid) -> Result<Option<OrderRecord>, StoreError> {
        let order = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(order)
    }

    async fn update_order_status(
        &mut self,
        order: OrderUuid,
        status: OrderStatus,
        updated_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let rows_affected = query(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .bind(SqlxTimestamp::from(updated_at))
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn record_delivery(
        &mut self,
        order: OrderUuid,
        delivery: &DeliveryRecord,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let rows_affected = query(RECORD_DELIVERY_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .bind(SqlxTimestamp::from(delivery.sent_at))
            .bind(delivery.payload.expose())
            .bind(SqlxTimestamp::from(delivery.sent_at))
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn list_orders(
        &mut self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let orders = query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(filter.status.map(OrderStatus::as_str))
            .bind(filter.payment_status.map(PaymentStatus::as_str))
            .bind(filter.user_id.as_ref().map(UserId::as_str))
            .bind(filter.created_from.map(SqlxTimestamp::from))
            .bind(filter.created_to.map(SqlxTimestamp::from))
            .bind(after.map(|cursor| SqlxTimestamp::from(cursor.created_at)))
            .bind(after.map(|cursor| cursor.uuid.into_uuid()))
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(orders)
    }
}

fn column_error(column: &str, source: impl StdError + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn try_get_parsed<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    let value: String = row.try_get(column)?;

    value.parse().map_err(|e| column_error(column, e))
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let user_id: String = row.try_get("user_id")?;
        let user_id = UserId::parse(&user_id).map_err(|e| column_error("user_id", e))?;

        let delivery_sent_at: Option<SqlxTimestamp> = row.try_get("delivery_sent_at")?;
        let delivery_payload: Option<String> = row.try_get("delivery_payload")?;

        let delivery = delivery_sent_at
            .zip(delivery_payload)
            .map(|(sent_at, payload)| DeliveryRecord {
                sent_at: sent_at.to_jiff(),
                payload: DeliveryPayload::new(payload),
            });

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            order_number: row.try_get("order_number")?,
            user_id,
            items: row.try_get::<Json<Vec<OrderLine>>, _>("items")?.0,
            totals: OrderTotals {
                subtotal: try_get_amount(row, "subtotal")?,
                tax: try_get_amount(row, "tax")?,
                discount: try_get_amount(row, "discount")?,
                total: try_get_amount(row, "total")?,
            },
            currency: row.try_get("currency")?,
            status: try_get_parsed(row, "status")?,
            payment_status: try_get_parsed(row, "payment_status")?,
            payment_method: row.try_get("payment_method")?,
            payment_id: row.try_get("payment_id")?,
            billing_address: row.try_get::<Json<Address>, _>("billing_address")?.0,
            delivery_method: try_get_parsed(row, "delivery_method")?,
            delivery_email: row.try_get("delivery_email")?,
            notes: row.try_get("notes")?,
            delivery,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
