//! # neptune-sql-core
//!
//! A fluent SQL query builder decoupled from the database it runs against.
//!
//! This crate provides:
//! - A mutable, chainable [`Query`] that records clauses and renders them on demand
//! - Pluggable dialect [`Formatter`]s, looked up by the tag a driver reports
//! - The [`Driver`] contract every backend implements, plus a [`DebugDriver`]
//!   that records queries instead of running them
//! - Explicit registries for drivers and formatters, built from configuration
//!
//! ## Building queries
//!
//! ```rust
//! use neptune_sql_core::{DebugDriver, DriverRegistry, QueryFactory};
//! use std::sync::Arc;
//!
//! let mut drivers = DriverRegistry::new();
//! drivers.register("debug", Arc::new(DebugDriver::new()));
//! let factory = QueryFactory::new(drivers);
//!
//! let mut query = factory.select()?;
//! query
//!     .fields(["id", "name"])
//!     .from("users")
//!     .and_where("email", "bob@example.com")
//!     .and_where("name LIKE", "")
//!     .order_by("name", "desc");
//!
//! // The blank value dropped the second filter.
//! assert_eq!(
//!     query.to_sql()?,
//!     "SELECT id, name FROM users WHERE email = 'bob@example.com' ORDER BY name DESC"
//! );
//! # Ok::<(), neptune_sql_core::QueryError>(())
//! ```
//!
//! ## Placeholders
//!
//! The value `"?"` is stored as a bare placeholder, so the statement can bind
//! it later:
//!
//! ```rust
//! use neptune_sql_core::{DebugDriver, DriverRegistry, QueryFactory, SqlValue};
//! use std::sync::Arc;
//!
//! let mut drivers = DriverRegistry::new();
//! drivers.register("debug", Arc::new(DebugDriver::new()));
//! let factory = QueryFactory::new(drivers);
//!
//! let mut query = factory.delete()?;
//! query.from("sessions").and_where("user_id", "?");
//! let mut statement = query.prepare()?;
//! statement.execute(&[SqlValue::Int(42)])?;
//!
//! assert_eq!(
//!     statement.executed_query().as_deref(),
//!     Some("DELETE FROM sessions WHERE user_id = '42'")
//! );
//! # Ok::<(), neptune_sql_core::QueryError>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod factory;
pub mod formatter;
pub mod query;
pub mod value;

pub use config::{ConfigError, ConnectionConfig, DatabaseConfig, DriverConfig};
pub use driver::{
    DebugDriver, DebugStatement, Driver, DriverBuilders, DriverRegistry, InsertId, Statement,
};
pub use error::{QueryError, Result};
pub use factory::QueryFactory;
pub use formatter::{Formatter, FormatterRegistry, GenericFormatter};
pub use query::{Clause, Clauses, Query, QueryKind};
pub use value::{SqlValue, ToSqlValue};

/// The types most callers need.
pub mod prelude {
    pub use crate::driver::{Driver, DriverRegistry, Statement};
    pub use crate::error::{QueryError, Result};
    pub use crate::factory::QueryFactory;
    pub use crate::formatter::Formatter;
    pub use crate::query::{Query, QueryKind};
    pub use crate::value::{SqlValue, ToSqlValue};
}
