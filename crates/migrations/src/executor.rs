//! Query execution seam between the migration system and the database
//!
//! Migration units, the ledger and the service all talk to the database
//! through the [`QueryExecutor`] trait, so transactional execution and
//! test doubles plug in at a single point.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{MigrationError, MigrationResult};

/// Executes SQL against the target database.
///
/// `begin`/`commit`/`rollback` demarcate a transaction on the same handle:
/// every `execute` between `begin` and `commit` runs inside it, which is how
/// a transactional migration's statements and its ledger insert end up
/// atomic.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a statement, returning the number of affected rows.
    /// Parameters are bound positionally as strings.
    async fn execute(&self, sql: &str, params: &[String]) -> MigrationResult<u64>;

    /// Fetch all rows of a query with every column rendered as a string
    async fn fetch_string_rows(
        &self,
        sql: &str,
        params: &[String],
    ) -> MigrationResult<Vec<Vec<String>>>;

    /// Open a transaction on this handle
    async fn begin(&self) -> MigrationResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> MigrationResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> MigrationResult<()>;
}

/// Default executor backed by a `sqlx` Postgres pool.
///
/// While a transaction is open, all statements route through it; otherwise
/// they run directly on the pool.
pub struct PgPoolExecutor {
    pool: PgPool,
    transaction: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl PgPoolExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            transaction: Mutex::new(None),
        }
    }

    /// Connect to the database and wrap the resulting pool
    pub async fn connect(database_url: &str) -> MigrationResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| MigrationError::Database(format!("Failed to connect: {}", e)))?;
        Ok(Self::new(pool))
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for PgPoolExecutor {
    async fn execute(&self, sql: &str, params: &[String]) -> MigrationResult<u64> {
        debug!(sql, "Executing statement");

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param);
        }

        let mut guard = self.transaction.lock().await;
        let result = match guard.as_mut() {
            Some(tx) => query.execute(&mut **tx).await?,
            None => query.execute(&self.pool).await?,
        };

        Ok(result.rows_affected())
    }

    async fn fetch_string_rows(
        &self,
        sql: &str,
        params: &[String],
    ) -> MigrationResult<Vec<Vec<String>>> {
        debug!(sql, "Fetching rows");

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param);
        }

        let mut guard = self.transaction.lock().await;
        let rows = match guard.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = Vec::with_capacity(row.len());
            for index in 0..row.len() {
                let value: String = row
                    .try_get(index)
                    .map_err(|e| MigrationError::Database(e.to_string()))?;
                values.push(value);
            }
            result.push(values);
        }

        Ok(result)
    }

    async fn begin(&self) -> MigrationResult<()> {
        let mut guard = self.transaction.lock().await;
        if guard.is_some() {
            return Err(MigrationError::Transaction(
                "A transaction is already open on this executor".to_string(),
            ));
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MigrationError::Transaction(format!("Failed to begin: {}", e)))?;
        *guard = Some(tx);

        debug!("Transaction started");
        Ok(())
    }

    async fn commit(&self) -> MigrationResult<()> {
        let mut guard = self.transaction.lock().await;
        let tx = guard.take().ok_or_else(|| {
            MigrationError::Transaction("No open transaction to commit".to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| MigrationError::Transaction(format!("Failed to commit: {}", e)))?;

        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&self) -> MigrationResult<()> {
        let mut guard = self.transaction.lock().await;
        let tx = guard.take().ok_or_else(|| {
            MigrationError::Transaction("No open transaction to roll back".to_string())
        })?;

        tx.rollback()
            .await
            .map_err(|e| MigrationError::Transaction(format!("Failed to roll back: {}", e)))?;

        debug!("Transaction rolled back");
        Ok(())
    }
}
