//! The contract every database backend implements.
//!
//! A driver prepares query text into a [`Statement`], quotes values for
//! safe embedding, and tells the builder which formatter pairs with it.
//! Drivers are shared as `Arc<dyn Driver>`; they keep their per-query state
//! behind interior mutability so every method takes `&self`.

mod debug;
mod registry;

pub use debug::{DebugDriver, DebugStatement};
pub use registry::{DriverBuilders, DriverConstructor, DriverRegistry};

use crate::error::Result;
use crate::value::SqlValue;

/// Result of [`Driver::last_insert_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertId {
    /// The id generated by the last insert.
    Id(i64),
    /// The backend acknowledged the insert but has no id to report.
    Acknowledged,
}

impl InsertId {
    /// Returns the id, if the backend reported one.
    #[must_use]
    pub const fn id(self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(id),
            Self::Acknowledged => None,
        }
    }
}

/// A prepared query handed out by a driver.
pub trait Statement: Send {
    /// Returns the prepared query text.
    fn sql(&self) -> &str;

    /// Executes the statement, binding `params` to its `?` placeholders in order.
    /// Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Backend errors pass through unchanged as
    /// [`QueryError::Backend`](crate::QueryError::Backend).
    fn execute(&mut self, params: &[SqlValue]) -> Result<u64>;

    /// Returns the text of the last execution, or `None` before one.
    fn executed_query(&self) -> Option<String>;
}

/// Trait implemented by database, cache-backed and debug backends.
pub trait Driver: Send + Sync {
    /// Compiles or records `sql` and returns a statement for it.
    ///
    /// # Errors
    ///
    /// Backend errors pass through unchanged as
    /// [`QueryError::Backend`](crate::QueryError::Backend).
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>>;

    /// Escapes `value` into a literal that can be embedded in query text.
    fn quote(&self, value: &SqlValue) -> String;

    /// Returns the tag of the formatter paired with this driver.
    fn builder_name(&self) -> String;

    /// Pairs the driver with another formatter.
    fn set_builder_name(&self, name: &str);

    /// Forgets the current query and statement.
    fn reset(&self);

    /// Returns the last prepared query text.
    fn prepared_query(&self) -> Option<String>;

    /// Returns the last executed query text, or `None` until something ran.
    fn executed_query(&self) -> Option<String>;

    /// Returns the id generated by the last insert.
    ///
    /// # Errors
    ///
    /// Backend errors pass through unchanged.
    fn last_insert_id(&self, column: Option<&str>) -> Result<InsertId>;
}
