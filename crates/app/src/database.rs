//! Storage client
//!
//! Services never talk to a backend directly. They receive an
//! `Arc<dyn Store>`, open one [`StoreTransaction`] per unit of work, and
//! commit it. Dropping a transaction without committing discards its writes.

use std::fmt::Debug;

use async_trait::async_trait;
use jiff::{Timestamp, Unit};
use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

use crate::domain::{
    orders::repository::OrdersRepository, products::repository::ProductsRepository,
    reviews::repository::ReviewsRepository,
};

pub mod memory;
pub mod postgres;
mod retry;

pub use memory::{MemoryFault, MemoryStore};
pub use postgres::{PgStore, PgTransaction, connect};
pub use retry::{Retryable, RetryPolicy, retry_on_conflict};

/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction conflicted with a concurrent writer")]
    Conflict,

    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("referenced record does not exist")]
    InvalidReference,

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("stored value could not be decoded: {0}")]
    Decode(String),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether retrying the whole transaction may succeed.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                return Self::Unavailable(error.to_string());
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                return Self::Decode(error.to_string());
            }
            _ => {}
        }

        let Some(database_error) = error.as_database_error() else {
            return Self::Sql(error);
        };

        if matches!(
            database_error.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
        ) {
            return Self::Conflict;
        }

        match DatabaseError::kind(database_error) {
            ErrorKind::UniqueViolation => Self::UniqueViolation,
            ErrorKind::ForeignKeyViolation => Self::InvalidReference,
            _ => Self::Sql(error),
        }
    }
}

/// A handle on a storage backend.
#[async_trait]
pub trait Store: Debug + Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;
}

/// One unit of work against the backend.
///
/// Reads observe the transaction's own writes. Nothing is visible to other
/// transactions until [`StoreTransaction::commit`] succeeds.
#[async_trait]
pub trait StoreTransaction:
    OrdersRepository + ReviewsRepository + ProductsRepository + Send
{
    /// Make every write in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Current time at the precision the PostgreSQL backend stores.
#[must_use]
pub fn now() -> Timestamp {
    let now = Timestamp::now();

    now.round(Unit::Microsecond).unwrap_or(now)
}
