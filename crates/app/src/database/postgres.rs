//! PostgreSQL backend

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, migrate::MigrateError, postgres::PgRow, query};

use crate::database::{Store, StoreError, StoreTransaction};

const SET_SERIALIZABLE_SQL: &str = "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails or the database is unreachable.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let mut tx = self.pool.begin().await?;

        query(SET_SERIALIZABLE_SQL).execute(&mut *tx).await?;

        Ok(Box::new(PgTransaction { tx }))
    }
}

/// A `SERIALIZABLE` PostgreSQL transaction. Rolled back on drop.
pub struct PgTransaction {
    pub(crate) tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { tx } = *self;

        tx.commit().await?;

        Ok(())
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Convert an unsigned amount or count for a `BIGINT` column.
pub(crate) fn to_db_amount(column: &str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|e| {
        StoreError::from(sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
}

pub(crate) fn try_get_amount(row: &PgRow, column: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(column)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
