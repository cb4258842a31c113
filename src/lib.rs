//! Database abstraction layer for the Vantage business-management suite.
//!
//! Three pieces, consumed by every repository in the system:
//!
//! - a dialect-agnostic [`QueryBuilder`](builder::QueryBuilder) plus static
//!   INSERT/UPDATE/DELETE builders that render `(sql, params)` pairs,
//! - the [`DatabaseAdapter`](adapter::DatabaseAdapter) contract with a
//!   transactional unit-of-work helper,
//! - one concrete backend, [`PostgresAdapter`](postgres::PostgresAdapter),
//!   over a shared deadpool connection pool.
//!
//! Callers write SQL with `?` placeholders regardless of dialect; translation,
//! dialect idiom rewrites, and parameter-shape normalization happen in the
//! adapter. Tenant isolation is the caller's SQL (`WHERE tenant_id = ?`);
//! this layer has no notion of tenancy.

pub mod adapter;
pub mod builder;
pub mod dialect;
pub mod error;
pub mod normalize;
pub mod postgres;
pub mod prelude;
pub mod results;
pub mod types;

pub use adapter::DatabaseAdapter;
pub use builder::QueryBuilder;
pub use error::DbError;
pub use postgres::{PgPoolConfig, PoolHandle, PostgresAdapter};
pub use results::{ExecResult, PoolStats, QueryAndParams, ResultSet, Row};
pub use types::{Dialect, SqlValue};
