//! Convenient imports for repository code.
//!
//! Re-exports the integration surface so business repositories can
//! `use vantage_db::prelude::*;` and get going.

pub use crate::adapter::DatabaseAdapter;
pub use crate::builder::{OnConflict, QueryBuilder, delete, insert, update};
pub use crate::dialect::{DialectRenderer, IgnoreClause};
pub use crate::error::DbError;
pub use crate::normalize::{
    has_returning_clause, normalize_params, rewrite_insert_or_ignore, rewrite_placeholders,
};
pub use crate::postgres::{PgPoolConfig, PoolHandle, PostgresAdapter};
pub use crate::results::{ExecResult, PoolStats, QueryAndParams, ResultSet, Row};
pub use crate::types::{Dialect, SqlValue};
