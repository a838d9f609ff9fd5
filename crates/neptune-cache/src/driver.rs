//! The contract shared by cache backends.

use std::time::Duration;

use crate::error::Result;

/// Trait implemented by cache backends.
///
/// Keys are namespaced with the backend's configured prefix unless the
/// backend was obtained through its `unprefixed` view.
pub trait CacheDriver: Send + Sync {
    /// Stores `value` only if `key` is not already present.
    /// Returns `false` when the key exists.
    ///
    /// # Errors
    ///
    /// Invalid keys and transport or server failures.
    fn add(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool>;

    /// Stores `value` under `key`, replacing any previous value.
    /// Returns whether the server stored it.
    ///
    /// # Errors
    ///
    /// Invalid keys and transport or server failures.
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool>;

    /// Returns the value stored under `key`, or `None` on a miss.
    ///
    /// # Errors
    ///
    /// Invalid keys and transport or server failures.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removes `key`. Returns `false` if it was not present.
    ///
    /// # Errors
    ///
    /// Invalid keys and transport or server failures.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Invalidates every item, after `delay` when given.
    ///
    /// The whole cache is flushed, not only keys under the prefix.
    ///
    /// # Errors
    ///
    /// Transport or server failures.
    fn flush(&self, delay: Option<Duration>) -> Result<()>;
}

/// Key namespace applied by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyPrefix {
    prefix: String,
    enabled: bool,
}

impl KeyPrefix {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            enabled: true,
        }
    }

    pub(crate) fn disabled(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            enabled: false,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn apply(&self, key: &str) -> String {
        if self.enabled {
            format!("{}{key}", self.prefix)
        } else {
            key.to_string()
        }
    }
}
