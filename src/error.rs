use thiserror::Error;

/// Errors produced by the builder, the adapter contract, and the Postgres backend.
#[derive(Debug, Error)]
pub enum DbError {
    /// Rendering a SELECT without a FROM target.
    #[error("missing FROM clause: call from() before rendering a SELECT")]
    MissingFromClause,

    /// ORDER BY direction other than ASC or DESC.
    #[error("invalid ORDER BY direction: {0}")]
    InvalidOrderDirection(String),

    /// Negative LIMIT.
    #[error("invalid LIMIT: {0}")]
    InvalidLimit(i64),

    /// Negative OFFSET.
    #[error("invalid OFFSET: {0}")]
    InvalidOffset(i64),

    /// A contract primitive was called on a backend that does not implement it.
    /// Distinct from a query failure so a partial backend fails loudly in tests.
    #[error("not implemented by this adapter: {0}")]
    NotImplemented(&'static str),

    /// Driver-level failure. Propagated as-is; retry policy belongs to the caller.
    #[error("query execution failed: {0}")]
    QueryError(#[from] tokio_postgres::Error),

    #[error(transparent)]
    PoolError(#[from] deadpool_postgres::PoolError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("parameter conversion error: {0}")]
    ParameterError(String),

    /// Begin/commit/rollback called out of order (double begin, commit without begin, ...).
    #[error("transaction state error: {0}")]
    TransactionState(String),

    /// The unit of work passed to `transaction()` failed and was rolled back.
    /// `rollback_error` is populated when the rollback itself also failed.
    #[error("transaction aborted: {source}{}", rollback_fragment(.rollback_error))]
    TransactionAborted {
        #[source]
        source: Box<DbError>,
        rollback_error: Option<Box<DbError>>,
    },
}

fn rollback_fragment(rollback_error: &Option<Box<DbError>>) -> String {
    match rollback_error {
        Some(err) => format!(" (rollback also failed: {err})"),
        None => String::new(),
    }
}

impl DbError {
    /// The original unit-of-work error wrapped by `TransactionAborted`, if any.
    #[must_use]
    pub fn abort_cause(&self) -> Option<&DbError> {
        match self {
            DbError::TransactionAborted { source, .. } => Some(source),
            _ => None,
        }
    }
}
