//! Per-dialect rendering strategy.
//!
//! The builder never branches on dialect strings; it talks to a
//! [`DialectRenderer`] obtained from [`Dialect::renderer`]. Each dialect is a
//! unit struct implementing the trait.

use crate::types::Dialect;

/// How a dialect expresses "insert, ignore conflicts".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreClause {
    /// Replace the statement verb (`INSERT OR IGNORE INTO ...`).
    Verb(&'static str),
    /// Append a clause after `VALUES (...)`.
    Suffix(String),
    /// No native form; the statement is rendered unchanged.
    Unsupported,
}

/// Dialect-specific rendering hooks consumed by the query builder.
pub trait DialectRenderer: Send + Sync {
    /// Positional placeholder for the 1-based `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Conflict-ignoring insert clause for the given column list.
    fn insert_ignore(&self, columns: &[&str]) -> IgnoreClause;

    /// Upsert clause: insert falling back to update on a uniqueness conflict.
    ///
    /// Default body renders the Postgres idiom, which SQLite also accepts.
    fn upsert_update(&self, conflict_column: &str, columns: &[&str]) -> String {
        let assignments = columns
            .iter()
            .map(|col| format!("{col} = EXCLUDED.{col}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("ON CONFLICT ({conflict_column}) DO UPDATE SET {assignments}")
    }
}

struct PostgresRenderer;
struct MysqlRenderer;
struct SqliteRenderer;
struct MssqlRenderer;

impl DialectRenderer for PostgresRenderer {
    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn insert_ignore(&self, _columns: &[&str]) -> IgnoreClause {
        IgnoreClause::Suffix("ON CONFLICT DO NOTHING".to_string())
    }
}

impl DialectRenderer for MysqlRenderer {
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn insert_ignore(&self, columns: &[&str]) -> IgnoreClause {
        let assignments = columns
            .iter()
            .map(|col| format!("{col} = VALUES({col})"))
            .collect::<Vec<_>>()
            .join(", ");
        IgnoreClause::Suffix(format!("ON DUPLICATE KEY UPDATE {assignments}"))
    }

    fn upsert_update(&self, _conflict_column: &str, columns: &[&str]) -> String {
        // MySQL has no ON CONFLICT; its duplicate-key form covers the same intent.
        let assignments = columns
            .iter()
            .map(|col| format!("{col} = VALUES({col})"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("ON DUPLICATE KEY UPDATE {assignments}")
    }
}

impl DialectRenderer for SqliteRenderer {
    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn insert_ignore(&self, _columns: &[&str]) -> IgnoreClause {
        IgnoreClause::Verb("INSERT OR IGNORE")
    }
}

impl DialectRenderer for MssqlRenderer {
    fn placeholder(&self, index: usize) -> String {
        format!("@p{index}")
    }

    fn insert_ignore(&self, _columns: &[&str]) -> IgnoreClause {
        IgnoreClause::Unsupported
    }
}

impl Dialect {
    /// The rendering strategy for this dialect.
    #[must_use]
    pub fn renderer(&self) -> &'static dyn DialectRenderer {
        match self {
            Dialect::Postgres => &PostgresRenderer,
            Dialect::Mysql => &MysqlRenderer,
            Dialect::Sqlite => &SqliteRenderer,
            Dialect::Mssql => &MssqlRenderer,
        }
    }
}
