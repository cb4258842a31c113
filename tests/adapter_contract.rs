use std::sync::Arc;

use async_trait::async_trait;
use vantage_db::prelude::*;

/// Backend that only declares its dialect; every primitive inherits the
/// failing default.
struct PartialAdapter;

#[async_trait]
impl DatabaseAdapter for PartialAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

/// In-memory backend recording transaction-control calls.
#[derive(Default)]
struct MockAdapter {
    begun: u32,
    committed: u32,
    rolled_back: u32,
    fail_begin: bool,
    fail_rollback: bool,
}

#[async_trait]
impl DatabaseAdapter for MockAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn all(&mut self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
        Ok(vec![
            Row::new(Arc::new(vec!["id".to_string()]), vec![SqlValue::Int(7)]),
            Row::new(Arc::new(vec!["id".to_string()]), vec![SqlValue::Int(8)]),
        ])
    }

    async fn begin_transaction(&mut self) -> Result<(), DbError> {
        if self.fail_begin {
            return Err(DbError::ConnectionError("no connection available".into()));
        }
        self.begun += 1;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.committed += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.rolled_back += 1;
        if self.fail_rollback {
            return Err(DbError::ConnectionError("rollback wire failure".into()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn partial_adapter_fails_loudly_with_not_implemented() {
    let mut adapter = PartialAdapter;
    assert!(matches!(
        adapter.all("SELECT 1", &[]).await.unwrap_err(),
        DbError::NotImplemented("all")
    ));
    assert!(matches!(
        adapter.run("DELETE FROM t", &[]).await.unwrap_err(),
        DbError::NotImplemented("run")
    ));
    assert!(matches!(
        adapter.query_raw("SELECT 1", &[]).await.unwrap_err(),
        DbError::NotImplemented("query_raw")
    ));
    assert!(matches!(
        adapter.execute_batch("SELECT 1;").await.unwrap_err(),
        DbError::NotImplemented("execute_batch")
    ));
    assert!(matches!(
        adapter.close().await.unwrap_err(),
        DbError::NotImplemented("close")
    ));
    assert!(matches!(
        adapter.begin_transaction().await.unwrap_err(),
        DbError::NotImplemented("begin_transaction")
    ));
}

#[tokio::test]
async fn get_inherits_not_implemented_from_all() {
    let mut adapter = PartialAdapter;
    assert!(matches!(
        adapter.get("SELECT 1", &[]).await.unwrap_err(),
        DbError::NotImplemented("all")
    ));
}

#[tokio::test]
async fn pool_stats_defaults_to_none() {
    let adapter = PartialAdapter;
    assert!(adapter.pool_stats().is_none());
}

#[tokio::test]
async fn is_alive_converts_failure_to_false() {
    let mut adapter = PartialAdapter;
    assert!(!adapter.is_alive().await);
}

#[tokio::test]
async fn is_alive_reports_true_when_select_one_succeeds() {
    let mut adapter = MockAdapter::default();
    assert!(adapter.is_alive().await);
}

#[tokio::test]
async fn get_defaults_to_first_row_of_all() {
    let mut adapter = MockAdapter::default();
    let row = adapter.get("SELECT id FROM t", &[]).await.unwrap().unwrap();
    assert_eq!(row.get("id"), Some(&SqlValue::Int(7)));
}

#[tokio::test]
async fn transaction_commits_exactly_once_on_success() {
    let mut adapter = MockAdapter::default();
    let value = adapter
        .transaction(|db| {
            Box::pin(async move {
                let rows = db.all("SELECT id FROM t", &[]).await?;
                Ok(rows.len())
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 2);
    assert_eq!(adapter.begun, 1);
    assert_eq!(adapter.committed, 1);
    assert_eq!(adapter.rolled_back, 0);
}

#[tokio::test]
async fn transaction_rolls_back_exactly_once_on_failure() {
    let mut adapter = MockAdapter::default();
    let err = adapter
        .transaction::<(), _>(|_db| {
            Box::pin(async move { Err(DbError::ConfigError("unit of work failed".into())) })
        })
        .await
        .unwrap_err();

    assert_eq!(adapter.begun, 1);
    assert_eq!(adapter.committed, 0);
    assert_eq!(adapter.rolled_back, 1);

    // The original error is what propagates, wrapped as TransactionAborted.
    match &err {
        DbError::TransactionAborted {
            source,
            rollback_error,
        } => {
            assert!(matches!(**source, DbError::ConfigError(_)));
            assert!(rollback_error.is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.abort_cause().is_some());
}

#[tokio::test]
async fn failed_rollback_surfaces_both_errors() {
    let mut adapter = MockAdapter {
        fail_rollback: true,
        ..MockAdapter::default()
    };
    let err = adapter
        .transaction::<(), _>(|_db| {
            Box::pin(async move { Err(DbError::ConfigError("unit of work failed".into())) })
        })
        .await
        .unwrap_err();

    match &err {
        DbError::TransactionAborted {
            source,
            rollback_error,
        } => {
            assert!(matches!(**source, DbError::ConfigError(_)));
            assert!(rollback_error.is_some());
        }
        other => panic!("unexpected error: {other}"),
    }

    let message = err.to_string();
    assert!(message.contains("unit of work failed"));
    assert!(message.contains("rollback wire failure"));
}

#[tokio::test]
async fn failed_begin_skips_commit_and_rollback() {
    let mut adapter = MockAdapter {
        fail_begin: true,
        ..MockAdapter::default()
    };
    let err = adapter
        .transaction::<(), _>(|_db| Box::pin(async move { Ok(()) }))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ConnectionError(_)));
    assert_eq!(adapter.committed, 0);
    assert_eq!(adapter.rolled_back, 0);
}
