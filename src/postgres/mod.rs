// PostgreSQL backend - the one concrete implementation of the adapter contract
//
// Split into sub-modules:
// - config: pool configuration and the injectable pool handle
// - params: parameter conversion between SqlValue and tokio-postgres types
// - query: result extraction and result-set building
// - adapter: the DatabaseAdapter implementation (normalization + transactions)

pub mod adapter;
pub mod config;
pub mod params;
pub mod query;

pub use adapter::PostgresAdapter;
pub use config::{PgPoolConfig, PoolHandle};
pub use params::Params;
pub use query::{extract_value, result_set_from_rows};
