//! Dialect formatters.
//!
//! A formatter turns a query's [`Clauses`] into the SQL text of one dialect.
//! The default methods produce ANSI-style SQL; a dialect overrides only the
//! fragments it writes differently. Drivers name their formatter by tag, and
//! the [`FormatterRegistry`] maps tags to instances.

mod generic;
mod registry;

pub use generic::GenericFormatter;
pub use registry::FormatterRegistry;

use crate::error::{QueryError, Result};
use crate::query::{Clause, Clauses, JoinEntry, Logic, OrderEntry, QueryKind, WhereEntry};
use crate::value::PLACEHOLDER;

/// Trailing operators after which a value is appended without `=`.
const TRAILING_OPERATORS: &[&str] = &["=", "<", ">", "<=", ">=", "!=", "<>"];
const TRAILING_KEYWORDS: &[&str] = &["LIKE", "ILIKE", "GLOB", "REGEXP", "IS", "NOT"];

/// Trait for dialect-specific query formatting.
pub trait Formatter: Send + Sync {
    /// Returns the tag drivers use to ask for this formatter.
    fn name(&self) -> &'static str;

    /// Formats a query of `kind`.
    ///
    /// Clauses outside the kind's allow-list are dropped before dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedQuery`] when a mandatory clause is missing.
    fn format(&self, kind: QueryKind, clauses: &Clauses) -> Result<String> {
        let clauses = clauses.restricted_to(kind);
        match kind {
            QueryKind::Select => self.format_select(&clauses),
            QueryKind::Insert => self.format_insert(&clauses),
            QueryKind::Update => self.format_update(&clauses),
            QueryKind::Delete => self.format_delete(&clauses),
        }
    }

    /// `SELECT [DISTINCT] fields FROM tables [JOIN] [WHERE] [ORDER BY] [LIMIT] [OFFSET]`
    ///
    /// # Errors
    ///
    /// Fails without a FROM clause.
    fn format_select(&self, clauses: &Clauses) -> Result<String> {
        let from = required(QueryKind::Select, Clause::From, clauses.from.as_deref())?;

        let mut sql = String::from("SELECT ");
        if clauses.distinct {
            sql.push_str("DISTINCT ");
        }
        match clauses.fields.as_deref() {
            Some(fields) if !fields.is_empty() => sql.push_str(&fields.join(", ")),
            _ => sql.push('*'),
        }
        sql.push_str(" FROM ");
        sql.push_str(&from.join(", "));

        let tail = [
            clauses.join.as_ref().map(|join| self.join_sql(join)),
            clauses
                .conditions
                .as_deref()
                .and_then(|conditions| self.where_sql(conditions)),
            clauses
                .order_by
                .as_deref()
                .and_then(|entries| self.order_by_sql(entries)),
            self.limit_sql(clauses.limit, clauses.offset),
        ];
        for fragment in tail.into_iter().flatten() {
            sql.push(' ');
            sql.push_str(&fragment);
        }
        Ok(sql)
    }

    /// `INSERT INTO table (fields) VALUES (?, ...)`
    ///
    /// # Errors
    ///
    /// Fails without INTO or FIELDS.
    fn format_insert(&self, clauses: &Clauses) -> Result<String> {
        let table = clauses
            .into
            .as_deref()
            .filter(|table| !table.is_empty())
            .ok_or(QueryError::MalformedQuery {
                kind: QueryKind::Insert,
                clause: Clause::Into,
            })?;
        let fields = required(QueryKind::Insert, Clause::Fields, clauses.fields.as_deref())?;

        Ok(format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            fields.join(", "),
            placeholders(fields.len())
        ))
    }

    /// `UPDATE tables SET field = ?, ... [WHERE]`
    ///
    /// # Errors
    ///
    /// Fails without TABLES or FIELDS.
    fn format_update(&self, clauses: &Clauses) -> Result<String> {
        let tables = required(QueryKind::Update, Clause::Tables, clauses.tables.as_deref())?;
        let fields = required(QueryKind::Update, Clause::Fields, clauses.fields.as_deref())?;

        let assignments: Vec<String> = fields
            .iter()
            .map(|field| format!("{field} = {PLACEHOLDER}"))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", tables.join(", "), assignments.join(", "));
        if let Some(filter) = clauses
            .conditions
            .as_deref()
            .and_then(|conditions| self.where_sql(conditions))
        {
            sql.push(' ');
            sql.push_str(&filter);
        }
        Ok(sql)
    }

    /// `DELETE FROM tables [WHERE]`
    ///
    /// # Errors
    ///
    /// Fails without a FROM clause.
    fn format_delete(&self, clauses: &Clauses) -> Result<String> {
        let from = required(QueryKind::Delete, Clause::From, clauses.from.as_deref())?;

        let mut sql = format!("DELETE FROM {}", from.join(", "));
        if let Some(filter) = clauses
            .conditions
            .as_deref()
            .and_then(|conditions| self.where_sql(conditions))
        {
            sql.push(' ');
            sql.push_str(&filter);
        }
        Ok(sql)
    }

    /// `[TYPE] JOIN table`
    fn join_sql(&self, join: &JoinEntry) -> String {
        match join.kind.as_deref().map(str::trim).filter(|kind| !kind.is_empty()) {
            Some(kind) => format!("{} JOIN {}", kind.to_uppercase(), join.table),
            None => format!("JOIN {}", join.table),
        }
    }

    /// `WHERE c1 AND c2 OR c3`, or `None` without conditions.
    ///
    /// The operator of the first condition is never written.
    fn where_sql(&self, conditions: &[WhereEntry]) -> Option<String> {
        let mut iter = conditions.iter();
        let first = iter.next()?;
        let mut sql = format!("WHERE {}", self.condition_sql(first));
        for entry in iter {
            sql.push(' ');
            sql.push_str(Logic::coerce(&entry.logic).as_str());
            sql.push(' ');
            sql.push_str(&self.condition_sql(entry));
        }
        Some(sql)
    }

    /// Renders one condition together with its value.
    ///
    /// The value fills the first `?` of the expression when there is one,
    /// follows a trailing comparison operator, or is compared with `=`.
    fn condition_sql(&self, entry: &WhereEntry) -> String {
        let expression = entry.expression.trim_end();
        let Some(value) = entry.value.as_deref() else {
            return expression.to_string();
        };
        if expression.contains(PLACEHOLDER) {
            expression.replacen(PLACEHOLDER, value, 1)
        } else if ends_with_operator(expression) {
            format!("{expression} {value}")
        } else {
            format!("{expression} = {value}")
        }
    }

    /// `ORDER BY e1 ASC, e2 DESC`, or `None` without entries.
    fn order_by_sql(&self, entries: &[OrderEntry]) -> Option<String> {
        if entries.is_empty() {
            return None;
        }
        let parts: Vec<String> = entries
            .iter()
            .map(|entry| format!("{} {}", entry.expression, entry.direction.as_str()))
            .collect();
        Some(format!("ORDER BY {}", parts.join(", ")))
    }

    /// `LIMIT n OFFSET m`, either part optional.
    fn limit_sql(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(limit), None) => Some(format!("LIMIT {limit}")),
            (None, Some(offset)) => Some(format!("OFFSET {offset}")),
            (Some(limit), Some(offset)) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        }
    }
}

/// Returns the names of a mandatory clause, failing when it is unset or empty.
///
/// # Errors
///
/// Returns [`QueryError::MalformedQuery`] naming `clause`.
pub fn required(kind: QueryKind, clause: Clause, names: Option<&[String]>) -> Result<&[String]> {
    names
        .filter(|names| !names.is_empty())
        .ok_or(QueryError::MalformedQuery { kind, clause })
}

/// `?, ?, ?` for `count` parameters.
#[must_use]
pub fn placeholders(count: usize) -> String {
    vec![PLACEHOLDER; count].join(", ")
}

fn ends_with_operator(expression: &str) -> bool {
    if TRAILING_OPERATORS.iter().any(|op| expression.ends_with(op)) {
        return true;
    }
    expression
        .rsplit(char::is_whitespace)
        .next()
        .is_some_and(|word| {
            TRAILING_KEYWORDS
                .iter()
                .any(|keyword| word.eq_ignore_ascii_case(keyword))
        })
}
