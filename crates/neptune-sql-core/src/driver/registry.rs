//! Named driver instances and the constructors that build them from configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::{DebugDriver, Driver};
use crate::config::{ConfigError, ConnectionConfig, DatabaseConfig, DriverConfig};
use crate::error::{QueryError, Result};

/// Builds a driver from its settings.
pub type DriverConstructor = Box<dyn Fn(&DriverConfig) -> Result<Arc<dyn Driver>> + Send + Sync>;

/// Driver constructors by driver kind (`debug`, `sqlite`, ...).
pub struct DriverBuilders {
    constructors: HashMap<String, DriverConstructor>,
}

impl DriverBuilders {
    /// Creates the builder table with the `debug` kind registered.
    #[must_use]
    pub fn new() -> Self {
        let mut builders = Self {
            constructors: HashMap::new(),
        };
        builders.register("debug", |config| {
            Ok(Arc::new(DebugDriver::from_config(config)?) as Arc<dyn Driver>)
        });
        builders
    }

    /// Registers the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&DriverConfig) -> Result<Arc<dyn Driver>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
        self
    }

    /// Returns whether a constructor exists for `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Builds the driver described by `connection`, applying its formatter override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDriver`] for unregistered kinds and
    /// whatever the constructor reports, typically missing keys.
    pub fn build(&self, connection: &ConnectionConfig) -> Result<Arc<dyn Driver>> {
        let constructor = self
            .constructors
            .get(&connection.driver)
            .ok_or_else(|| ConfigError::UnknownDriver(connection.driver.clone()))?;
        let driver = constructor(&connection.options)?;
        if let Some(builder) = &connection.builder {
            driver.set_builder_name(builder);
        }
        Ok(driver)
    }
}

impl Default for DriverBuilders {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DriverBuilders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("DriverBuilders").field("kinds", &kinds).finish()
    }
}

/// Live drivers by connection name, plus the default connection.
///
/// The registry is passed to whoever builds queries; nothing looks drivers
/// up through global state.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
    default: Option<String>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every configured connection eagerly.
    ///
    /// Without an explicit `default`, the first connection in name order
    /// becomes the default.
    ///
    /// # Errors
    ///
    /// The first construction error, or [`QueryError::UnresolvedDriver`] when
    /// `default` names a connection that is not configured.
    pub fn from_config(config: &DatabaseConfig, builders: &DriverBuilders) -> Result<Self> {
        let mut registry = Self::new();
        for (name, connection) in &config.connections {
            let driver = builders.build(connection)?;
            info!(name = %name, driver = %connection.driver, "Database connection configured");
            registry.register(name.clone(), driver);
        }
        if let Some(default) = &config.default {
            registry.set_default(default)?;
        }
        Ok(registry)
    }

    /// Registers `driver` under `name`. The first registered driver becomes
    /// the default until [`set_default`](Self::set_default) says otherwise.
    pub fn register(&mut self, name: impl Into<String>, driver: Arc<dyn Driver>) -> &mut Self {
        let name = name.into();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.drivers.insert(name, driver);
        self
    }

    /// Makes `name` the default connection.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnresolvedDriver`] if `name` is not registered.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.drivers.contains_key(name) {
            return Err(QueryError::UnresolvedDriver(name.to_string()));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Returns the default connection name.
    #[must_use]
    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Returns the driver registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Returns the registered connection names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves `name`, or the default connection when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnresolvedDriver`] for unknown names, or with
    /// the name `default` when no default exists.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn Driver>> {
        let name = match name {
            Some(name) => name,
            None => self
                .default
                .as_deref()
                .ok_or_else(|| QueryError::UnresolvedDriver(String::from("default")))?,
        };
        debug!(name, "Resolving database driver");
        self.get(name)
            .ok_or_else(|| QueryError::UnresolvedDriver(name.to_string()))
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("names", &self.names())
            .field("default", &self.default)
            .finish()
    }
}
