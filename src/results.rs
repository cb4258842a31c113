use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::types::SqlValue;

/// A single row from a query result.
///
/// Column names are shared across all rows in a result set via `Arc`, with a
/// shared name→index cache to avoid repeated string comparisons on lookup.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across the result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<SqlValue>,
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a standalone row with its own index cache.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let cache = build_index_cache(&column_names);
        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// The index of a column by name, or None if not found.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// The value at a column by name, or None if the column is unknown.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// The value at a column index, or None if out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }
}

fn build_index_cache(column_names: &Arc<Vec<String>>) -> Arc<HashMap<String, usize>> {
    Arc::new(
        column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect::<HashMap<_, _>>(),
    )
}

/// The rows returned by a query plus the affected-row count.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub rows: Vec<Row>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index_cache: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// A result set preallocated for `capacity` rows.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            column_index_cache: None,
        }
    }

    /// Set the column names shared by every row in this result set.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index_cache = Some(build_index_cache(&column_names));
        self.column_names = Some(column_names);
    }

    /// The shared column names, if any row has been described.
    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row sharing this result set's column header.
    ///
    /// No-op until `set_column_names` has been called.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) {
        if let (Some(column_names), Some(cache)) = (&self.column_names, &self.column_index_cache) {
            self.rows.push(Row {
                column_names: column_names.clone(),
                values,
                column_index_cache: cache.clone(),
            });
            self.rows_affected += 1;
        }
    }

    /// First row of the result set, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Uniform result of a write statement (INSERT/UPDATE/DELETE), regardless of
/// backend.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Rows returned by the statement (populated when it carries RETURNING).
    pub rows: ResultSet,
    /// Number of rows the statement affected.
    pub changes: u64,
    /// The first returned row's `id` column, when present and integral.
    pub last_insert_id: Option<i64>,
}

/// Point-in-time snapshot of the connection pool. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Connections sitting idle in the pool.
    pub idle: usize,
    /// Callers waiting for a connection.
    pub waiting: usize,
    /// Total connections the pool currently holds.
    pub total: usize,
}

/// A rendered SQL statement and its ordered parameter list.
///
/// The builder's output; also convenient for passing hand-written SQL and its
/// parameters around as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAndParams {
    /// The SQL text
    pub sql: String,
    /// The parameters bound to the statement, in placeholder order
    pub params: Vec<SqlValue>,
}

impl QueryAndParams {
    /// Bundle a statement with its parameters.
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Bundle a statement that takes no parameters.
    pub fn new_without_params(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}
