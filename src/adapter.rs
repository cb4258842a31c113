//! The uniform contract every database backend satisfies.
//!
//! Repositories depend only on [`DatabaseAdapter`]; the concrete backend
//! (currently [`PostgresAdapter`](crate::postgres::PostgresAdapter)) is wired
//! in at application startup. Every primitive has a default body that fails
//! with [`DbError::NotImplemented`], so a partially implemented backend fails
//! loudly in tests instead of silently returning empty data.
//!
//! All SQL written by callers uses `?` as the placeholder character regardless
//! of the target dialect; the backend translates.

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::DbError;
use crate::results::{ExecResult, PoolStats, ResultSet, Row};
use crate::types::{Dialect, SqlValue};

#[async_trait]
pub trait DatabaseAdapter: Send {
    /// The dialect this backend renders and executes.
    fn dialect(&self) -> Dialect;

    /// Execute a row-returning query and collect every row.
    async fn all(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
        let _ = (sql, params);
        Err(DbError::NotImplemented("all"))
    }

    /// Execute a row-returning query and take the first row, if any.
    async fn get(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, DbError> {
        Ok(self.all(sql, params).await?.into_iter().next())
    }

    /// Execute a write statement (INSERT/UPDATE/DELETE) and report the uniform
    /// result shape.
    async fn run(&mut self, sql: &str, params: &[SqlValue]) -> Result<ExecResult, DbError> {
        let _ = (sql, params);
        Err(DbError::NotImplemented("run"))
    }

    /// Escape hatch: execute a statement and hand back the backend's result
    /// set without interpreting it as a read or a write.
    async fn query_raw(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, DbError> {
        let _ = (sql, params);
        Err(DbError::NotImplemented("query_raw"))
    }

    /// Execute a string of multiple `;`-separated statements.
    ///
    /// Used only for migrations. Atomicity is backend-dependent; each adapter
    /// documents what one batch call guarantees.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), DbError> {
        let _ = sql;
        Err(DbError::NotImplemented("execute_batch"))
    }

    /// Tear down the backend's connection resources. Irrevocable.
    async fn close(&mut self) -> Result<(), DbError> {
        Err(DbError::NotImplemented("close"))
    }

    /// Point-in-time pool snapshot, or None when the backend exposes no pool.
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }

    /// Liveness probe. Never errors: any failure reports `false`.
    async fn is_alive(&mut self) -> bool {
        self.get("SELECT 1", &[]).await.is_ok()
    }

    async fn begin_transaction(&mut self) -> Result<(), DbError> {
        Err(DbError::NotImplemented("begin_transaction"))
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        Err(DbError::NotImplemented("commit"))
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        Err(DbError::NotImplemented("rollback"))
    }

    /// Run a unit of work inside a transaction.
    ///
    /// Begins a transaction, invokes `unit_of_work` with this adapter, and
    /// commits on success. If the unit of work fails, a rollback is attempted
    /// and the original error is re-raised as [`DbError::TransactionAborted`];
    /// a rollback failure is carried alongside it, never dropped. Exactly one
    /// of commit/rollback executes per invocation.
    ///
    /// ```rust,no_run
    /// use vantage_db::prelude::*;
    ///
    /// # async fn demo(adapter: &mut PostgresAdapter) -> Result<(), DbError> {
    /// let invoice_id = adapter
    ///     .transaction(|db| {
    ///         Box::pin(async move {
    ///             let result = db
    ///                 .run(
    ///                     "INSERT INTO invoices (tenant_id, total) VALUES (?, ?) RETURNING id",
    ///                     &[SqlValue::Int(7), SqlValue::Float(99.5)],
    ///                 )
    ///                 .await?;
    ///             db.run(
    ///                 "UPDATE inventory SET reserved = reserved + 1 WHERE sku = ?",
    ///                 &[SqlValue::Text("SKU-1".into())],
    ///             )
    ///             .await?;
    ///             Ok(result.last_insert_id)
    ///         })
    ///     })
    ///     .await?;
    /// # let _ = invoice_id;
    /// # Ok(()) }
    /// ```
    async fn transaction<T, F>(&mut self, unit_of_work: F) -> Result<T, DbError>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T, DbError>> + Send,
        Self: Sized,
    {
        self.begin_transaction().await?;
        match unit_of_work(self).await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(cause) => {
                let rollback_error = match self.rollback().await {
                    Ok(()) => None,
                    Err(err) => {
                        tracing::warn!(error = %err, "rollback failed after aborted unit of work");
                        Some(Box::new(err))
                    }
                };
                Err(DbError::TransactionAborted {
                    source: Box::new(cause),
                    rollback_error,
                })
            }
        }
    }
}
