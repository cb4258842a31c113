//! Dialect-agnostic query construction.
//!
//! [`QueryBuilder`] accumulates SELECT clauses and an ordered value list, then
//! renders dialect-correct SQL plus parameters as a
//! [`QueryAndParams`](crate::results::QueryAndParams). Conditions are written
//! with `?` placeholders; the builder renumbers them into the dialect's
//! positional form as clauses are added, so parameter order stays correct
//! across chained calls.
//!
//! ```rust
//! use vantage_db::prelude::*;
//!
//! let q = QueryBuilder::new(Dialect::Postgres)
//!     .select(&["id", "email"])
//!     .from("customers")
//!     .where_clause("tenant_id = ?", &[SqlValue::Int(7)])
//!     .and("status = ?", &[SqlValue::Text("active".into())])
//!     .order_by("email", "asc")
//!     .limit(50)
//!     .to_query()
//!     .unwrap();
//! assert_eq!(
//!     q.sql,
//!     "SELECT id, email FROM customers WHERE (tenant_id = $1) AND (status = $2) \
//!      ORDER BY email ASC LIMIT 50"
//! );
//! ```

mod dml;

pub use dml::{OnConflict, delete, insert, update};

use crate::error::DbError;
use crate::normalize::rewrite_placeholders;
use crate::results::QueryAndParams;
use crate::types::{Dialect, SqlValue};

/// Validation failures recorded while chaining; surfaced when the statement is
/// rendered, so a malformed query never reaches the driver.
#[derive(Debug, Clone, PartialEq)]
enum PendingError {
    InvalidOrderDirection(String),
    InvalidLimit(i64),
    InvalidOffset(i64),
}

impl From<PendingError> for DbError {
    fn from(err: PendingError) -> Self {
        match err {
            PendingError::InvalidOrderDirection(dir) => DbError::InvalidOrderDirection(dir),
            PendingError::InvalidLimit(n) => DbError::InvalidLimit(n),
            PendingError::InvalidOffset(n) => DbError::InvalidOffset(n),
        }
    }
}

/// Fluent accumulator for a SELECT statement.
///
/// Created per query and discarded after rendering, or recycled with
/// [`reset`](QueryBuilder::reset) / deep-copied with `clone()`.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: Dialect,
    select: Vec<String>,
    from: Option<String>,
    joins: Vec<String>,
    where_: Vec<String>,
    group_by: Vec<String>,
    having: Vec<String>,
    order_by: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    values: Vec<SqlValue>,
    error: Option<PendingError>,
}

impl QueryBuilder {
    /// A fresh builder targeting `dialect`.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            select: Vec::new(),
            from: None,
            joins: Vec::new(),
            where_: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            values: Vec::new(),
            error: None,
        }
    }

    /// The dialect this builder renders for.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The values bound so far, in placeholder order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Set the SELECT column list; an empty list selects `*`.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Set the FROM target.
    #[must_use]
    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(table.to_string());
        self
    }

    /// Set the FROM target with an alias.
    #[must_use]
    pub fn from_as(mut self, table: &str, alias: &str) -> Self {
        self.from = Some(format!("{table} {alias}"));
        self
    }

    /// Append an INNER JOIN. The ON condition is caller-supplied text and is
    /// not re-parameterized.
    #[must_use]
    pub fn inner_join(self, table: &str, on: &str) -> Self {
        self.push_join("INNER JOIN", table, None, on)
    }

    /// Append an INNER JOIN with a table alias.
    #[must_use]
    pub fn inner_join_as(self, table: &str, alias: &str, on: &str) -> Self {
        self.push_join("INNER JOIN", table, Some(alias), on)
    }

    /// Append a LEFT JOIN. The ON condition is caller-supplied text and is
    /// not re-parameterized.
    #[must_use]
    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.push_join("LEFT JOIN", table, None, on)
    }

    /// Append a LEFT JOIN with a table alias.
    #[must_use]
    pub fn left_join_as(self, table: &str, alias: &str, on: &str) -> Self {
        self.push_join("LEFT JOIN", table, Some(alias), on)
    }

    fn push_join(mut self, kind: &str, table: &str, alias: Option<&str>, on: &str) -> Self {
        let target = match alias {
            Some(alias) => format!("{table} {alias}"),
            None => table.to_string(),
        };
        self.joins.push(format!("{kind} {target} ON {on}"));
        self
    }

    /// Append a WHERE predicate. `?` placeholders in `condition` are
    /// renumbered to the dialect's positional form starting after the values
    /// already bound; `values` are appended to the value list. Predicates
    /// accumulate implicitly ANDed.
    #[must_use]
    pub fn where_clause(mut self, condition: &str, values: &[SqlValue]) -> Self {
        let rewritten = self.bind(condition, values);
        self.where_.push(rewritten);
        self
    }

    /// Alias for [`where_clause`](QueryBuilder::where_clause); reads naturally
    /// in chains.
    #[must_use]
    pub fn and(self, condition: &str, values: &[SqlValue]) -> Self {
        self.where_clause(condition, values)
    }

    /// OR the condition onto the immediately preceding predicate.
    ///
    /// With no prior predicate this behaves like
    /// [`where_clause`](QueryBuilder::where_clause). Otherwise the most
    /// recently pushed predicate is popped and re-pushed as
    /// `(previous) OR (new)`.
    ///
    /// Note: `or` binds only to the predicate added immediately before it,
    /// never to the whole WHERE clause. In
    /// `.where_clause("a = ?", ..).and("b = ?", ..).or("c = ?", ..)` the OR
    /// applies to `b = ?` alone; `a = ?` stays ANDed.
    #[must_use]
    pub fn or(mut self, condition: &str, values: &[SqlValue]) -> Self {
        let rewritten = self.bind(condition, values);
        match self.where_.pop() {
            Some(previous) => self.where_.push(format!("({previous}) OR ({rewritten})")),
            None => self.where_.push(rewritten),
        }
        self
    }

    /// Append GROUP BY columns.
    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by
            .extend(columns.iter().map(|c| (*c).to_string()));
        self
    }

    /// Append a HAVING predicate, with the same placeholder renumbering rule
    /// as [`where_clause`](QueryBuilder::where_clause).
    #[must_use]
    pub fn having(mut self, condition: &str, values: &[SqlValue]) -> Self {
        let rewritten = self.bind(condition, values);
        self.having.push(rewritten);
        self
    }

    /// Append an ORDER BY term. `direction` is case-normalized; anything other
    /// than `ASC`/`DESC` fails the build with
    /// [`DbError::InvalidOrderDirection`].
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        let normalized = direction.to_ascii_uppercase();
        match normalized.as_str() {
            "ASC" | "DESC" => self.order_by.push(format!("{column} {normalized}")),
            _ => self.record_error(PendingError::InvalidOrderDirection(direction.to_string())),
        }
        self
    }

    /// Set the LIMIT. Negative counts fail the build with
    /// [`DbError::InvalidLimit`].
    #[must_use]
    pub fn limit(mut self, count: i64) -> Self {
        if count < 0 {
            self.record_error(PendingError::InvalidLimit(count));
        } else {
            self.limit = Some(count);
        }
        self
    }

    /// Set the OFFSET. Negative counts fail the build with
    /// [`DbError::InvalidOffset`].
    #[must_use]
    pub fn offset(mut self, count: i64) -> Self {
        if count < 0 {
            self.record_error(PendingError::InvalidOffset(count));
        } else {
            self.offset = Some(count);
        }
        self
    }

    /// Clear all clause and value state so the builder can be reused.
    pub fn reset(&mut self) -> &mut Self {
        self.select.clear();
        self.from = None;
        self.joins.clear();
        self.where_.clear();
        self.group_by.clear();
        self.having.clear();
        self.order_by.clear();
        self.limit = None;
        self.offset = None;
        self.values.clear();
        self.error = None;
        self
    }

    /// Render the SELECT statement and its parameter list.
    ///
    /// Clauses render in a fixed order: SELECT, FROM, JOIN, WHERE, GROUP BY,
    /// HAVING, ORDER BY, LIMIT, OFFSET. The number of placeholders in the
    /// rendered text always equals the length of the parameter list.
    ///
    /// # Errors
    /// [`DbError::MissingFromClause`] if `from()` was never called, or the
    /// first validation error recorded while chaining.
    pub fn to_select_query(&self) -> Result<QueryAndParams, DbError> {
        if let Some(err) = &self.error {
            return Err(err.clone().into());
        }
        let from = self.from.as_ref().ok_or(DbError::MissingFromClause)?;

        let columns = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {from}");
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.where_.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&parenthesized(&self.where_));
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&parenthesized(&self.having));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        Ok(QueryAndParams::new(sql, self.values.clone()))
    }

    /// Alias for [`to_select_query`](QueryBuilder::to_select_query).
    ///
    /// # Errors
    /// Same as `to_select_query`.
    pub fn to_query(&self) -> Result<QueryAndParams, DbError> {
        self.to_select_query()
    }

    /// Renumber `?` placeholders starting after the current value count and
    /// append the supplied values.
    fn bind(&mut self, condition: &str, values: &[SqlValue]) -> String {
        if values.is_empty() {
            return condition.to_string();
        }
        let renderer = self.dialect.renderer();
        let (rewritten, _) = rewrite_placeholders(condition, renderer, self.values.len());
        self.values.extend_from_slice(values);
        rewritten.into_owned()
    }

    fn record_error(&mut self, err: PendingError) {
        // First validation error wins; later ones would only obscure it.
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn parenthesized(predicates: &[String]) -> String {
    predicates
        .iter()
        .map(|p| format!("({p})"))
        .collect::<Vec<_>>()
        .join(" AND ")
}
