//! In-process cache backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use neptune_sql_core::DriverConfig;
use tracing::trace;

use crate::driver::{CacheDriver, KeyPrefix};
use crate::error::Result;
use crate::protocol;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

fn deadline(ttl: Option<Duration>, now: Instant) -> Option<Instant> {
    ttl.filter(|ttl| !ttl.is_zero())
        .and_then(|ttl| now.checked_add(ttl))
}

/// Cache kept in a map inside the process.
///
/// Follows the same rules as the memcached backend: keys are prefixed and
/// validated, a zero or absent TTL never expires, and clones share storage.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    prefix: KeyPrefix,
}

impl MemoryCache {
    /// Creates an empty cache using `prefix` for every key.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            prefix: KeyPrefix::new(prefix),
        }
    }

    /// Creates an empty cache from the `prefix` key.
    ///
    /// # Errors
    ///
    /// Fails when `prefix` is missing or not a string.
    pub fn from_config(config: &DriverConfig) -> Result<Self> {
        Ok(Self::new(config.get_str("memory", "prefix")?))
    }

    /// Returns a view of the same storage that uses keys as given.
    #[must_use]
    pub fn unprefixed(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            prefix: self.prefix.disabled(),
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries().values().filter(|entry| entry.is_live(now)).count()
    }

    /// Returns `true` if no live entry remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, key: &str) -> Result<String> {
        let key = self.prefix.apply(key);
        protocol::validate_key(&key)?;
        Ok(key)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheDriver for MemoryCache {
    fn add(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        let key = self.key(key)?;
        let now = Instant::now();
        let mut entries = self.entries();
        if entries.get(&key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key,
            Entry {
                value: value.to_vec(),
                expires_at: deadline(ttl, now),
            },
        );
        Ok(true)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        let key = self.key(key)?;
        let now = Instant::now();
        self.entries().insert(
            key,
            Entry {
                value: value.to_vec(),
                expires_at: deadline(ttl, now),
            },
        );
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = self.key(key)?;
        let now = Instant::now();
        let mut entries = self.entries();
        let value = entries
            .get(&key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());
        if value.is_none() {
            entries.remove(&key);
        }
        trace!(key = %key, hit = value.is_some(), "Cache lookup");
        Ok(value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let key = self.key(key)?;
        let now = Instant::now();
        Ok(self
            .entries()
            .remove(&key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    fn flush(&self, delay: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries();
        match deadline(delay, now) {
            None => entries.clear(),
            Some(at) => {
                for entry in entries.values_mut() {
                    entry.expires_at = Some(entry.expires_at.map_or(at, |current| current.min(at)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[test]
    fn test_set_get_delete() {
        let cache = MemoryCache::new("app:");
        assert!(cache.set("user", b"bob", None).unwrap());
        assert_eq!(cache.get("user").unwrap().as_deref(), Some(&b"bob"[..]));
        assert!(cache.delete("user").unwrap());
        assert!(!cache.delete("user").unwrap());
        assert_eq!(cache.get("user").unwrap(), None);
    }

    #[test]
    fn test_add_only_when_absent() {
        let cache = MemoryCache::new("");
        assert!(cache.add("k", b"1", None).unwrap());
        assert!(!cache.add("k", b"2", None).unwrap());
        assert_eq!(cache.get("k").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_prefix_is_applied_by_default() {
        let cache = MemoryCache::new("app:");
        cache.set("user", b"bob", None).unwrap();

        let raw = cache.unprefixed();
        assert_eq!(raw.get("user").unwrap(), None);
        assert_eq!(raw.get("app:user").unwrap(), Some(b"bob".to_vec()));
    }

    #[test]
    fn test_expired_entries_are_gone() {
        let cache = MemoryCache::new("t:");
        cache
            .set("short", b"x", Some(Duration::from_millis(20)))
            .unwrap();
        cache.set("forever", b"y", Some(Duration::ZERO)).unwrap();

        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(cache.get("short").unwrap(), None);
        assert_eq!(cache.get("forever").unwrap(), Some(b"y".to_vec()));
        assert!(cache.add("short", b"z", None).unwrap());
    }

    #[test]
    fn test_flush() {
        let cache = MemoryCache::new("t:");
        cache.set("a", b"1", None).unwrap();
        cache.set("b", b"2", None).unwrap();
        assert_eq!(cache.len(), 2);

        cache.flush(Some(Duration::from_millis(20))).unwrap();
        assert_eq!(cache.len(), 2);
        std::thread::sleep(Duration::from_millis(50));
        assert!(cache.is_empty());

        cache.set("c", b"3", None).unwrap();
        cache.flush(None).unwrap();
        assert_eq!(cache.get("c").unwrap(), None);
    }

    #[test]
    fn test_invalid_keys() {
        let cache = MemoryCache::new("app ");
        assert!(matches!(
            cache.set("user", b"x", None),
            Err(CacheError::InvalidKey(key)) if key == "app user"
        ));
    }

    #[test]
    fn test_from_config_requires_prefix() {
        assert!(matches!(
            MemoryCache::from_config(&DriverConfig::new()),
            Err(CacheError::Configuration(_))
        ));
        let cache = MemoryCache::from_config(&DriverConfig::new().with("prefix", "p:")).unwrap();
        cache.set("k", b"v", None).unwrap();
        assert!(cache.unprefixed().get("p:k").unwrap().is_some());
    }
}
