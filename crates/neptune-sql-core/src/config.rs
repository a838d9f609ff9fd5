//! Driver and connection configuration.
//!
//! A driver receives its settings once, as a [`DriverConfig`], and checks the
//! keys it needs in its constructor. Missing keys are reported together so a
//! broken configuration fails at setup time rather than on the first query.
//!
//! ```rust
//! use neptune_sql_core::config::DatabaseConfig;
//!
//! let config = DatabaseConfig::from_json_str(r#"{
//!     "default": "main",
//!     "connections": {
//!         "main": { "driver": "sqlite", "database": "app.sqlite3" },
//!         "log": { "driver": "debug", "builder": "generic" }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.default.as_deref(), Some("main"));
//! assert_eq!(config.connections["log"].builder.as_deref(), Some("generic"));
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Configuration errors. Always fatal, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required keys are absent.
    #[error("missing required configuration key(s) for {driver} driver: {}", .keys.join(", "))]
    MissingKeys {
        /// Driver kind being configured.
        driver: String,
        /// Every missing key, in the order the driver requires them.
        keys: Vec<String>,
    },

    /// A key is present but holds a value of the wrong shape.
    #[error("invalid value for '{key}' in {driver} driver configuration: expected {expected}")]
    InvalidValue {
        /// Driver kind being configured.
        driver: String,
        /// Offending key.
        key: String,
        /// Description of the accepted values.
        expected: &'static str,
    },

    /// A connection names a driver kind no constructor is registered for.
    #[error("unknown driver kind '{0}'")]
    UnknownDriver(String),

    /// The configuration document is not valid JSON for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings for one driver instance (host, port, credentials, key prefix, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverConfig(BTreeMap<String, Value>);

impl DriverConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a setting, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a setting.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the raw value of a setting.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns whether a non-null value is set for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    /// Checks that every key in `keys` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKeys`] listing all absent keys.
    pub fn require(&self, driver: &str, keys: &[&str]) -> Result<(), ConfigError> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| !self.contains(key))
            .map(|key| (*key).to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys {
                driver: driver.to_string(),
                keys: missing,
            })
        }
    }

    /// Returns a required string setting.
    ///
    /// # Errors
    ///
    /// Fails when the key is missing or not a string.
    pub fn get_str(&self, driver: &str, key: &str) -> Result<&str, ConfigError> {
        self.require(driver, &[key])?;
        self.get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(driver, key, "a string"))
    }

    /// Returns an optional string setting.
    #[must_use]
    pub fn get_opt_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns a required port number. Numeric strings are accepted.
    ///
    /// # Errors
    ///
    /// Fails when the key is missing or does not fit in a `u16`.
    pub fn get_u16(&self, driver: &str, key: &str) -> Result<u16, ConfigError> {
        self.require(driver, &[key])?;
        let parsed = match self.get(key) {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| invalid(driver, key, "an integer between 0 and 65535"))
    }

    /// Returns a required unsigned integer. Numeric strings are accepted.
    ///
    /// # Errors
    ///
    /// Fails when the key is missing or does not fit in a `u32`.
    pub fn get_u32(&self, driver: &str, key: &str) -> Result<u32, ConfigError> {
        self.require(driver, &[key])?;
        let parsed = match self.get(key) {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| invalid(driver, key, "a non-negative 32-bit integer"))
    }
}

fn invalid(driver: &str, key: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        driver: driver.to_string(),
        key: key.to_string(),
        expected,
    }
}

/// One named connection: which driver kind to build and its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Driver kind, e.g. `sqlite` or `debug`.
    pub driver: String,
    /// Overrides the formatter tag the driver reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
    /// Remaining driver settings.
    #[serde(flatten)]
    pub options: DriverConfig,
}

/// All configured connections plus the default one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection used when a query does not name one.
    #[serde(default)]
    pub default: Option<String>,
    /// Connections by name.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl DatabaseConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_every_missing_key() {
        let config = DriverConfig::new().with("host", "localhost");
        let err = config
            .require("memcached", &["host", "port", "prefix"])
            .unwrap_err();

        match &err {
            ConfigError::MissingKeys { driver, keys } => {
                assert_eq!(driver, "memcached");
                assert_eq!(keys, &["port", "prefix"]);
            }
            other => panic!("Expected MissingKeys, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "missing required configuration key(s) for memcached driver: port, prefix"
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let config = DriverConfig::new().with("prefix", Value::Null);
        assert!(!config.contains("prefix"));
        assert!(config.require("memcached", &["prefix"]).is_err());
    }

    #[test]
    fn test_get_u16_accepts_numbers_and_numeric_strings() {
        let config = DriverConfig::new().with("a", 11211).with("b", "6379");
        assert_eq!(config.get_u16("test", "a").unwrap(), 11211);
        assert_eq!(config.get_u16("test", "b").unwrap(), 6379);
    }

    #[test]
    fn test_get_u16_rejects_out_of_range() {
        let config = DriverConfig::new().with("port", 70000);
        assert!(matches!(
            config.get_u16("memcached", "port"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_get_u32() {
        let config = DriverConfig::new().with("timeout", "1500").with("bad", -1);
        assert_eq!(config.get_u32("memcached", "timeout").unwrap(), 1500);
        assert!(config.get_u32("memcached", "bad").is_err());
        assert!(matches!(
            config.get_u32("memcached", "missing"),
            Err(ConfigError::MissingKeys { .. })
        ));
    }

    #[test]
    fn test_get_str_rejects_non_strings() {
        let config = DriverConfig::new().with("database", 5);
        assert!(matches!(
            config.get_str("sqlite", "database"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_connection_options_are_flattened() {
        let config = DatabaseConfig::from_json_str(
            r#"{"connections": {"cache": {"driver": "memcached", "host": "127.0.0.1", "port": 11211}}}"#,
        )
        .unwrap();

        let cache = &config.connections["cache"];
        assert_eq!(cache.driver, "memcached");
        assert_eq!(cache.builder, None);
        assert_eq!(cache.options.get_opt_str("host"), Some("127.0.0.1"));
        assert_eq!(cache.options.get_u16("memcached", "port").unwrap(), 11211);
        assert!(config.default.is_none());
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            DatabaseConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
