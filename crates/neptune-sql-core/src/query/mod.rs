//! The fluent query builder.
//!
//! A [`Query`] records clauses as they are added and only turns them into
//! SQL when asked, through the [`Formatter`] paired with its driver. Every
//! mutator returns `&mut Self`, so calls chain:
//!
//! ```rust
//! use neptune_sql_core::{DebugDriver, DriverRegistry, QueryFactory};
//! use std::sync::Arc;
//!
//! let mut drivers = DriverRegistry::new();
//! drivers.register("debug", Arc::new(DebugDriver::new()));
//! let factory = QueryFactory::new(drivers);
//!
//! let sql = factory
//!     .select()?
//!     .from("users")
//!     .and_where("active", 1)
//!     .order_by("name", "asc")
//!     .limit(10)
//!     .to_sql()?;
//!
//! assert_eq!(sql, "SELECT * FROM users WHERE active = '1' ORDER BY name ASC LIMIT 10");
//! # Ok::<(), neptune_sql_core::QueryError>(())
//! ```

mod clause;
mod names;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

pub use clause::{
    Clause, Clauses, JoinEntry, Logic, OrderDirection, OrderEntry, QueryKind, WhereEntry,
};
pub use names::IntoNames;

use crate::driver::{Driver, Statement};
use crate::error::Result;
use crate::formatter::Formatter;
use crate::value::{PLACEHOLDER, ToSqlValue};

/// One query under construction.
#[derive(Clone)]
pub struct Query {
    kind: QueryKind,
    clauses: Clauses,
    driver: Arc<dyn Driver>,
    formatter: Arc<dyn Formatter>,
}

impl Query {
    /// Creates an empty query of `kind` bound to `driver`, formatted by `formatter`.
    ///
    /// Most callers go through [`QueryFactory`](crate::QueryFactory), which
    /// picks the formatter the driver asks for.
    #[must_use]
    pub fn new(kind: QueryKind, driver: Arc<dyn Driver>, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            kind,
            clauses: Clauses::default(),
            driver,
            formatter,
        }
    }

    /// Returns the query kind.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Returns every clause set so far, including ones this kind ignores.
    #[must_use]
    pub const fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    /// Appends columns. Repeated calls accumulate, duplicates included.
    pub fn fields(&mut self, names: impl IntoNames) -> &mut Self {
        append(&mut self.clauses.fields, names.into_names());
        self
    }

    /// Appends source tables.
    pub fn from(&mut self, tables: impl IntoNames) -> &mut Self {
        append(&mut self.clauses.from, tables.into_names());
        self
    }

    /// Appends UPDATE target tables.
    pub fn tables(&mut self, tables: impl IntoNames) -> &mut Self {
        append(&mut self.clauses.tables, tables.into_names());
        self
    }

    /// Sets the INSERT target table. The last call wins.
    pub fn into_table(&mut self, table: &str) -> &mut Self {
        self.clauses.into = Some(table.to_string());
        self
    }

    /// Appends a condition.
    ///
    /// A blank `value` (see [`SqlValue::is_blank`](crate::SqlValue::is_blank))
    /// leaves the query unchanged, so optional filters can be passed straight
    /// through. A NULL value adds the bare expression. The `?` placeholder is
    /// stored as is; any other value goes through the driver's `quote`.
    pub fn where_clause(&mut self, expression: &str, value: impl ToSqlValue, logic: &str) -> &mut Self {
        let value = value.to_sql_value();
        let stored = if value.is_null() {
            None
        } else if value.is_blank() {
            trace!(expression, "Skipping condition with blank value");
            return self;
        } else if value.is_placeholder() {
            Some(PLACEHOLDER.to_string())
        } else {
            Some(self.driver.quote(&value))
        };
        self.push_condition(expression.to_string(), stored, logic)
    }

    /// Appends a condition without a value, joined with AND.
    pub fn where_expr(&mut self, expression: &str) -> &mut Self {
        self.push_condition(expression.to_string(), None, "AND")
    }

    /// Appends a condition joined with AND.
    pub fn and_where(&mut self, expression: &str, value: impl ToSqlValue) -> &mut Self {
        self.where_clause(expression, value, "AND")
    }

    /// Appends a condition joined with OR.
    pub fn or_where(&mut self, expression: &str, value: impl ToSqlValue) -> &mut Self {
        self.where_clause(expression, value, "OR")
    }

    /// Appends `column IN (v1,v2,...)` with every value quoted by the driver.
    pub fn where_in<I>(&mut self, column: &str, values: I, logic: &str) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToSqlValue,
    {
        let quoted: Vec<String> = values
            .into_iter()
            .map(|value| self.driver.quote(&value.to_sql_value()))
            .collect();
        let expression = format!("{column} IN ({})", quoted.join(","));
        self.push_condition(expression, None, logic)
    }

    /// [`where_in`](Self::where_in) joined with AND.
    pub fn and_where_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToSqlValue,
    {
        self.where_in(column, values, "AND")
    }

    /// [`where_in`](Self::where_in) joined with OR.
    pub fn or_where_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToSqlValue,
    {
        self.where_in(column, values, "OR")
    }

    /// Appends a sort expression. `sort` is `ASC` unless it reads `DESC`.
    pub fn order_by(&mut self, expression: &str, sort: &str) -> &mut Self {
        self.clauses
            .order_by
            .get_or_insert_with(Vec::new)
            .push(OrderEntry {
                expression: expression.to_string(),
                direction: OrderDirection::normalize(sort),
            });
        self
    }

    /// Sets the row limit.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.clauses.limit = Some(limit);
        self
    }

    /// Sets the row offset.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.clauses.offset = Some(offset);
        self
    }

    /// Selects distinct rows only.
    pub fn distinct(&mut self) -> &mut Self {
        self.clauses.distinct = true;
        self
    }

    /// Sets the joined table. Only one join is kept; the last call wins.
    pub fn join(&mut self, table: &str, kind: Option<&str>) -> &mut Self {
        self.clauses.join = Some(JoinEntry {
            table: table.to_string(),
            kind: kind.map(str::to_string),
        });
        self
    }

    /// Returns the target tables for this kind: FROM for SELECT and DELETE,
    /// INTO for INSERT, TABLES for UPDATE.
    #[must_use]
    pub fn tables_for_kind(&self) -> Option<Vec<String>> {
        match self.kind {
            QueryKind::Select | QueryKind::Delete => self.clauses.from.clone(),
            QueryKind::Insert => self.clauses.into.clone().map(|table| vec![table]),
            QueryKind::Update => self.clauses.tables.clone(),
        }
    }

    /// Returns the columns, or `None` if none were given.
    #[must_use]
    pub fn get_fields(&self) -> Option<&[String]> {
        self.clauses.fields.as_deref()
    }

    /// Returns the bound driver.
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Rebinds the query to another driver. Values quoted so far keep the
    /// previous driver's quoting.
    pub fn set_driver(&mut self, driver: Arc<dyn Driver>) -> &mut Self {
        self.driver = driver;
        self
    }

    /// Returns the formatter rendering this query.
    #[must_use]
    pub fn formatter(&self) -> &Arc<dyn Formatter> {
        &self.formatter
    }

    /// Renders the query. Runs the formatter on every call and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedQuery`](crate::QueryError::MalformedQuery)
    /// when a clause mandatory for this kind is missing.
    pub fn to_sql(&self) -> Result<String> {
        self.formatter.format(self.kind, &self.clauses)
    }

    /// Renders the query and hands it to the driver.
    ///
    /// # Errors
    ///
    /// Formatting errors, and whatever the driver's `prepare` reports.
    pub fn prepare(&self) -> Result<Box<dyn Statement>> {
        let sql = self.to_sql()?;
        debug!(kind = %self.kind, sql = %sql, "Preparing query");
        self.driver.prepare(&sql)
    }

    /// Hands `sql` to the driver verbatim, ignoring the clauses.
    ///
    /// # Errors
    ///
    /// Whatever the driver's `prepare` reports.
    pub fn prepare_override(&self, sql: &str) -> Result<Box<dyn Statement>> {
        debug!(kind = %self.kind, sql = %sql, "Preparing hand-written query");
        self.driver.prepare(sql)
    }

    fn push_condition(&mut self, expression: String, value: Option<String>, logic: &str) -> &mut Self {
        self.clauses
            .conditions
            .get_or_insert_with(Vec::new)
            .push(WhereEntry {
                expression,
                value,
                logic: logic.to_uppercase(),
            });
        self
    }
}

fn append(slot: &mut Option<Vec<String>>, names: Vec<String>) {
    slot.get_or_insert_with(Vec::new).extend(names);
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("kind", &self.kind)
            .field("clauses", &self.clauses)
            .field("formatter", &self.formatter.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DebugDriver;
    use crate::formatter::GenericFormatter;

    fn select() -> Query {
        Query::new(
            QueryKind::Select,
            Arc::new(DebugDriver::new()),
            Arc::new(GenericFormatter::new()),
        )
    }

    #[test]
    fn test_fields_accumulate() {
        let mut query = select();
        query.fields("id").fields(["name", "id"]);
        assert_eq!(query.get_fields().unwrap(), ["id", "name", "id"]);
    }

    #[test]
    fn test_get_fields_absent() {
        assert!(select().get_fields().is_none());
    }

    #[test]
    fn test_into_last_call_wins() {
        let mut query = select();
        query.into_table("a").into_table("b");
        assert_eq!(query.clauses().into.as_deref(), Some("b"));
    }

    #[test]
    fn test_where_quotes_values() {
        let mut query = select();
        query.and_where("name", "O'Brien");
        let entry = &query.clauses().conditions.as_ref().unwrap()[0];
        assert_eq!(entry.value.as_deref(), Some("'O\\'Brien'"));
    }

    #[test]
    fn test_where_null_keeps_bare_expression() {
        let mut query = select();
        query.where_clause("deleted_at IS NULL", None::<i32>, "and");
        let entry = &query.clauses().conditions.as_ref().unwrap()[0];
        assert_eq!(entry.value, None);
        assert_eq!(entry.logic, "AND");
    }

    #[test]
    fn test_logic_uppercased_on_storage() {
        let mut query = select();
        query.where_clause("a", 1, "or").where_clause("b", 2, "xor");
        let conditions = query.clauses().conditions.as_ref().unwrap();
        assert_eq!(conditions[0].logic, "OR");
        assert_eq!(conditions[1].logic, "XOR");
    }

    #[test]
    fn test_join_last_call_wins() {
        let mut query = select();
        query.join("a", None).join("b ON b.id = t.b_id", Some("left"));
        assert_eq!(
            query.clauses().join,
            Some(JoinEntry {
                table: String::from("b ON b.id = t.b_id"),
                kind: Some(String::from("left")),
            })
        );
    }

    #[test]
    fn test_tables_for_kind() {
        let driver: Arc<dyn Driver> = Arc::new(DebugDriver::new());
        let formatter: Arc<dyn Formatter> = Arc::new(GenericFormatter::new());

        let mut insert = Query::new(QueryKind::Insert, driver.clone(), formatter.clone());
        assert_eq!(insert.tables_for_kind(), None);
        insert.into_table("logs");
        assert_eq!(insert.tables_for_kind(), Some(vec![String::from("logs")]));

        let mut update = Query::new(QueryKind::Update, driver, formatter);
        update.from("ignored").tables(["a", "b"]);
        assert_eq!(
            update.tables_for_kind(),
            Some(vec![String::from("a"), String::from("b")])
        );
    }
}
