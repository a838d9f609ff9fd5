//! Entry point for building queries against registered drivers.

use std::sync::Arc;

use tracing::debug;

use crate::driver::{Driver, DriverRegistry};
use crate::error::Result;
use crate::formatter::{Formatter, FormatterRegistry};
use crate::query::{Query, QueryKind};

/// Creates queries bound to a driver and the formatter that driver asks for.
///
/// The factory is handed its registries explicitly and can be cloned
/// cheaply into whatever code builds queries.
#[derive(Debug, Clone, Default)]
pub struct QueryFactory {
    drivers: DriverRegistry,
    formatters: FormatterRegistry,
}

impl QueryFactory {
    /// Creates a factory over `drivers` with the built-in formatters.
    #[must_use]
    pub fn new(drivers: DriverRegistry) -> Self {
        Self::with_formatters(drivers, FormatterRegistry::new())
    }

    /// Creates a factory with an explicit formatter registry.
    #[must_use]
    pub const fn with_formatters(drivers: DriverRegistry, formatters: FormatterRegistry) -> Self {
        Self {
            drivers,
            formatters,
        }
    }

    /// Returns the driver registry.
    #[must_use]
    pub const fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    /// Returns the driver registry for registering more connections.
    #[must_use]
    pub fn drivers_mut(&mut self) -> &mut DriverRegistry {
        &mut self.drivers
    }

    /// Returns the formatter registry.
    #[must_use]
    pub const fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    /// Returns the formatter registry for registering dialects.
    #[must_use]
    pub fn formatters_mut(&mut self) -> &mut FormatterRegistry {
        &mut self.formatters
    }

    /// Creates an empty query of `kind` on the named driver, or on the
    /// default driver when `driver` is `None`.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnresolvedDriver`](crate::QueryError::UnresolvedDriver)
    /// when the driver is unknown, and
    /// [`QueryError::UnknownFormatter`](crate::QueryError::UnknownFormatter)
    /// when the driver's formatter tag is not registered.
    pub fn query_for(&self, kind: QueryKind, driver: Option<&str>) -> Result<Query> {
        let driver = self.drivers.resolve(driver)?;
        let formatter = self.formatter_for(driver.as_ref())?;
        debug!(kind = %kind, formatter = formatter.name(), "Created query");
        Ok(Query::new(kind, driver, formatter))
    }

    /// Returns the formatter `driver` is paired with.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownFormatter`](crate::QueryError::UnknownFormatter)
    /// when the tag is not registered.
    pub fn formatter_for(&self, driver: &dyn Driver) -> Result<Arc<dyn Formatter>> {
        self.formatters.resolve(&driver.builder_name())
    }

    /// Creates a SELECT query on the named driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn select_for(&self, driver: Option<&str>) -> Result<Query> {
        self.query_for(QueryKind::Select, driver)
    }

    /// Creates an INSERT query on the named driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn insert_for(&self, driver: Option<&str>) -> Result<Query> {
        self.query_for(QueryKind::Insert, driver)
    }

    /// Creates an UPDATE query on the named driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn update_for(&self, driver: Option<&str>) -> Result<Query> {
        self.query_for(QueryKind::Update, driver)
    }

    /// Creates a DELETE query on the named driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn delete_for(&self, driver: Option<&str>) -> Result<Query> {
        self.query_for(QueryKind::Delete, driver)
    }

    /// SELECT on the default driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn select(&self) -> Result<Query> {
        self.select_for(None)
    }

    /// INSERT on the default driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn insert(&self) -> Result<Query> {
        self.insert_for(None)
    }

    /// UPDATE on the default driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn update(&self) -> Result<Query> {
        self.update_for(None)
    }

    /// DELETE on the default driver.
    ///
    /// # Errors
    ///
    /// See [`query_for`](Self::query_for).
    pub fn delete(&self) -> Result<Query> {
        self.delete_for(None)
    }
}
