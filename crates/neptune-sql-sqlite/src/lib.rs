//! # neptune-sql-sqlite
//!
//! SQLite backend for `neptune-sql-core`.
//!
//! # How SQLite differs from the generic dialect
//!
//! - **Literals**: single quotes are doubled and backslashes are ordinary
//!   characters, so [`SqliteDriver`] quotes with standard SQL literals.
//! - **[LIMIT and OFFSET]**: an `OFFSET` needs a `LIMIT`; [`SqliteFormatter`]
//!   writes `LIMIT -1` when only an offset is set.
//! - **[Rowids]**: the last inserted rowid is tracked per connection, so
//!   `last_insert_id` ignores its column argument.
//!
//! [LIMIT and OFFSET]: https://www.sqlite.org/lang_select.html#limitoffset
//! [Rowids]: https://www.sqlite.org/c3ref/last_insert_rowid.html
//!
//! ## Example
//!
//! ```rust
//! use neptune_sql_core::{DriverConfig, DriverRegistry, FormatterRegistry, QueryFactory, SqlValue};
//! use neptune_sql_sqlite::{SqliteDriver, register_formatter};
//! use std::sync::Arc;
//!
//! let driver = SqliteDriver::connect(&DriverConfig::new().with("database", ":memory:"))?;
//! driver.execute_raw("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let mut drivers = DriverRegistry::new();
//! drivers.register("main", Arc::new(driver));
//! let mut formatters = FormatterRegistry::new();
//! register_formatter(&mut formatters);
//! let factory = QueryFactory::with_formatters(drivers, formatters);
//!
//! let mut insert = factory.insert()?;
//! insert.into_table("users").fields("name");
//! let mut statement = insert.prepare()?;
//! statement.execute(&[SqlValue::Text("Alice".into())])?;
//!
//! let mut select = factory.select()?;
//! select.from("users").offset(1);
//! assert_eq!(select.to_sql()?, "SELECT * FROM users LIMIT -1 OFFSET 1");
//! # Ok::<(), neptune_sql_core::QueryError>(())
//! ```

mod driver;
mod formatter;

use std::sync::Arc;

use neptune_sql_core::FormatterRegistry;

pub use driver::{SqliteDriver, SqliteStatement, register};
pub use formatter::SqliteFormatter;

/// Adds [`SqliteFormatter`] to `formatters` under the `sqlite` tag.
pub fn register_formatter(formatters: &mut FormatterRegistry) -> &mut FormatterRegistry {
    formatters.register(Arc::new(SqliteFormatter::new()))
}
