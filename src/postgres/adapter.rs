//! The Postgres implementation of the adapter contract.
//!
//! Every incoming statement passes through the normalization pipeline
//! (`INSERT OR IGNORE` rewrite, `?` → `$N`, parameter-shape normalization)
//! before it reaches the driver, so repositories write dialect-agnostic SQL.
//!
//! Transactions pin a single pooled connection: `begin_transaction` checks one
//! out and issues `BEGIN` on it, every statement while the transaction is
//! active routes through that same connection, and `commit`/`rollback` run on
//! it before it is released back to the pool. `BEGIN`/`COMMIT` are never sent
//! through the pool's round-robin path, so a different physical connection can
//! never finish a transaction it did not run. A pinned connection that cannot
//! be released cleanly (failed COMMIT/ROLLBACK, adapter dropped mid-
//! transaction) is detached from the pool and destroyed rather than recycled.

use std::borrow::Cow;

use async_trait::async_trait;
use deadpool_postgres::Object;

use crate::adapter::DatabaseAdapter;
use crate::error::DbError;
use crate::normalize::{
    has_returning_clause, normalize_params, rewrite_insert_or_ignore, rewrite_placeholders,
};
use crate::results::{ExecResult, PoolStats, ResultSet, Row};
use crate::types::{Dialect, SqlValue};

use super::config::PoolHandle;
use super::params::Params;
use super::query::result_set_from_rows;

/// Destroy a pinned connection instead of recycling it. The pool's fast
/// recycling performs no transaction cleanup, so a connection with an open or
/// indeterminate transaction must never reach another caller.
fn discard_pinned(conn: Object) {
    drop(Object::take(conn));
}

/// Pooled Postgres adapter. Cheap to construct per request; all instances
/// share the injected [`PoolHandle`].
pub struct PostgresAdapter {
    pool: PoolHandle,
    // Connection pinned for the duration of an active transaction.
    tx_conn: Option<Object>,
}

impl PostgresAdapter {
    #[must_use]
    pub fn new(pool: PoolHandle) -> Self {
        Self {
            pool,
            tx_conn: None,
        }
    }

    /// The shared pool handle this adapter executes against.
    #[must_use]
    pub fn pool(&self) -> &PoolHandle {
        &self.pool
    }

    /// Whether a transaction is currently active on this adapter.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx_conn.is_some()
    }

    /// Apply the SQL-text half of the normalization pipeline.
    fn normalize_sql(sql: &str) -> Cow<'_, str> {
        match rewrite_insert_or_ignore(sql) {
            Cow::Borrowed(s) => rewrite_placeholders(s, Dialect::Postgres.renderer(), 0).0,
            Cow::Owned(s) => {
                let (rewritten, _) =
                    rewrite_placeholders(&s, Dialect::Postgres.renderer(), 0);
                Cow::Owned(rewritten.into_owned())
            }
        }
    }

    async fn query_normalized(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<tokio_postgres::Row>, DbError> {
        let converted = Params::convert(params)?;
        match &self.tx_conn {
            Some(conn) => Ok(conn.query(sql, converted.as_refs()).await?),
            None => {
                let conn = self.pool.checkout().await?;
                Ok(conn.query(sql, converted.as_refs()).await?)
            }
        }
    }

    async fn execute_normalized(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<u64, DbError> {
        let converted = Params::convert(params)?;
        match &self.tx_conn {
            Some(conn) => Ok(conn.execute(sql, converted.as_refs()).await?),
            None => {
                let conn = self.pool.checkout().await?;
                Ok(conn.execute(sql, converted.as_refs()).await?)
            }
        }
    }

    async fn select_result_set(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<ResultSet, DbError> {
        let sql = Self::normalize_sql(sql);
        let params = normalize_params(params);
        let rows = self.query_normalized(sql.as_ref(), params.as_ref()).await?;
        result_set_from_rows(&rows)
    }
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn all(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
        Ok(self.select_result_set(sql, params).await?.rows)
    }

    async fn run(&mut self, sql: &str, params: &[SqlValue]) -> Result<ExecResult, DbError> {
        let normalized = Self::normalize_sql(sql);
        let params = normalize_params(params);

        // tokio-postgres cannot report both returned rows and an affected-row
        // count from one parameterized call; a RETURNING clause (outside
        // literals and comments) selects the row path.
        if has_returning_clause(normalized.as_ref()) {
            let rows = self
                .query_normalized(normalized.as_ref(), params.as_ref())
                .await?;
            let result_set = result_set_from_rows(&rows)?;
            let last_insert_id = result_set
                .first()
                .and_then(|row| row.get("id"))
                .and_then(SqlValue::as_int)
                .copied();
            Ok(ExecResult {
                changes: result_set.len() as u64,
                last_insert_id,
                rows: result_set,
            })
        } else {
            let changes = self
                .execute_normalized(normalized.as_ref(), params.as_ref())
                .await?;
            Ok(ExecResult {
                changes,
                last_insert_id: None,
                rows: ResultSet::default(),
            })
        }
    }

    async fn query_raw(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, DbError> {
        self.select_result_set(sql, params).await
    }

    /// Execute a multi-statement batch via the simple-query protocol.
    ///
    /// The whole batch runs as one implicit transaction unless it contains
    /// explicit BEGIN/COMMIT statements of its own. Placeholders are not
    /// supported; migrations are plain SQL text.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), DbError> {
        tracing::debug!(bytes = sql.len(), "executing sql batch");
        match &self.tx_conn {
            Some(conn) => conn.batch_execute(sql).await?,
            None => {
                let conn = self.pool.checkout().await?;
                conn.batch_execute(sql).await?;
            }
        }
        Ok(())
    }

    /// Tear down the shared pool. Irrevocable: every adapter sharing the
    /// handle stops working. Intended only for process termination; prefer
    /// [`PoolHandle::shutdown`] at the composition root.
    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.tx_conn.take() {
            tracing::warn!("pool closed while a transaction was active; work discarded");
            discard_pinned(conn);
        }
        self.pool.shutdown();
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(self.pool.stats())
    }

    async fn begin_transaction(&mut self) -> Result<(), DbError> {
        if self.tx_conn.is_some() {
            return Err(DbError::TransactionState(
                "transaction already active on this adapter".to_string(),
            ));
        }
        let conn = self.pool.checkout().await?;
        conn.batch_execute("BEGIN").await?;
        tracing::debug!("transaction begun on pinned connection");
        self.tx_conn = Some(conn);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        let conn = self.tx_conn.take().ok_or_else(|| {
            DbError::TransactionState("commit without an active transaction".to_string())
        })?;
        if let Err(err) = conn.batch_execute("COMMIT").await {
            // Transaction state is indeterminate after a failed COMMIT.
            discard_pinned(conn);
            return Err(err.into());
        }
        tracing::debug!("transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        let conn = self.tx_conn.take().ok_or_else(|| {
            DbError::TransactionState("rollback without an active transaction".to_string())
        })?;
        if let Err(err) = conn.batch_execute("ROLLBACK").await {
            discard_pinned(conn);
            return Err(err.into());
        }
        tracing::debug!("transaction rolled back");
        Ok(())
    }
}

impl Drop for PostgresAdapter {
    fn drop(&mut self) {
        if let Some(conn) = self.tx_conn.take() {
            // Cancellation can drop the adapter between BEGIN and COMMIT.
            // Destroying the connection aborts the transaction server-side.
            tracing::warn!("adapter dropped with an active transaction; pinned connection discarded");
            discard_pinned(conn);
        }
    }
}
