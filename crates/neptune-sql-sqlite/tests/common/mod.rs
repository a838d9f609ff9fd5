#![allow(dead_code)]

use std::sync::Arc;

use neptune_sql_core::{DriverConfig, DriverRegistry, FormatterRegistry, QueryFactory};
use neptune_sql_sqlite::{SqliteDriver, register_formatter};

pub const SCHEMA: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT,
    active INTEGER NOT NULL DEFAULT 1
)";

pub fn memory_driver() -> Arc<SqliteDriver> {
    let driver = SqliteDriver::connect(&DriverConfig::new().with("database", ":memory:"))
        .unwrap_or_else(|e| panic!("Failed to open in-memory database: {e}"));
    driver
        .execute_raw(SCHEMA)
        .unwrap_or_else(|e| panic!("Failed to create schema: {e}"));
    Arc::new(driver)
}

pub fn formatters() -> FormatterRegistry {
    let mut formatters = FormatterRegistry::new();
    register_formatter(&mut formatters);
    formatters
}

/// Factory over one in-memory database with the `users` table, plus the driver.
pub fn sqlite_factory() -> (QueryFactory, Arc<SqliteDriver>) {
    let driver = memory_driver();
    let mut drivers = DriverRegistry::new();
    drivers.register("main", driver.clone());
    (QueryFactory::with_formatters(drivers, formatters()), driver)
}
