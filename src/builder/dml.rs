//! One-off INSERT/UPDATE/DELETE statement construction.
//!
//! Free functions independent of the fluent SELECT state: each renders a
//! complete `(sql, params)` pair for the given dialect.

use crate::dialect::IgnoreClause;
use crate::results::QueryAndParams;
use crate::normalize::rewrite_placeholders;
use crate::types::{Dialect, SqlValue};

/// Conflict handling for [`insert`].
#[derive(Debug, Clone, PartialEq)]
pub enum OnConflict {
    /// Skip rows that violate a uniqueness constraint.
    Ignore,
    /// Update the conflicting row instead (upsert).
    Update {
        /// Column the uniqueness conflict is detected on. `Default` uses `id`.
        conflict_column: String,
    },
}

impl Default for OnConflict {
    fn default() -> Self {
        OnConflict::Update {
            conflict_column: "id".to_string(),
        }
    }
}

/// Build `INSERT INTO table (...) VALUES (...)`, with optional conflict
/// handling rendered by the dialect strategy.
#[must_use]
pub fn insert(
    dialect: Dialect,
    table: &str,
    columns: &[(&str, SqlValue)],
    on_conflict: Option<OnConflict>,
) -> QueryAndParams {
    let renderer = dialect.renderer();
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let values: Vec<SqlValue> = columns.iter().map(|(_, value)| value.clone()).collect();
    let placeholders: Vec<String> = (1..=columns.len())
        .map(|i| renderer.placeholder(i))
        .collect();

    let mut verb = "INSERT";
    let mut suffix = None;
    match on_conflict {
        Some(OnConflict::Ignore) => match renderer.insert_ignore(&names) {
            IgnoreClause::Verb(v) => verb = v,
            IgnoreClause::Suffix(clause) => suffix = Some(clause),
            IgnoreClause::Unsupported => {}
        },
        Some(OnConflict::Update { conflict_column }) => {
            suffix = Some(renderer.upsert_update(&conflict_column, &names));
        }
        None => {}
    }

    let mut sql = format!(
        "{verb} INTO {table} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    );
    if let Some(clause) = suffix {
        sql.push(' ');
        sql.push_str(&clause);
    }

    QueryAndParams::new(sql, values)
}

/// Build `UPDATE table SET ... WHERE ...`.
///
/// SET placeholders are numbered first; `?` placeholders in `where_clause` are
/// renumbered to continue after them.
#[must_use]
pub fn update(
    dialect: Dialect,
    table: &str,
    columns: &[(&str, SqlValue)],
    where_clause: &str,
    where_values: &[SqlValue],
) -> QueryAndParams {
    let renderer = dialect.renderer();
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{name} = {}", renderer.placeholder(i + 1)))
        .collect();
    let (rewritten_where, _) = rewrite_placeholders(where_clause, renderer, columns.len());

    let sql = format!(
        "UPDATE {table} SET {} WHERE {rewritten_where}",
        assignments.join(", ")
    );

    let mut params: Vec<SqlValue> = columns.iter().map(|(_, value)| value.clone()).collect();
    params.extend_from_slice(where_values);
    QueryAndParams::new(sql, params)
}

/// Build `DELETE FROM table WHERE ...`.
///
/// `?` placeholders in `where_clause` are renumbered left to right from 1 (no
/// values precede them).
#[must_use]
pub fn delete(
    dialect: Dialect,
    table: &str,
    where_clause: &str,
    where_values: &[SqlValue],
) -> QueryAndParams {
    let renderer = dialect.renderer();
    let (rewritten_where, _) = rewrite_placeholders(where_clause, renderer, 0);
    QueryAndParams::new(
        format!("DELETE FROM {table} WHERE {rewritten_where}"),
        where_values.to_vec(),
    )
}
