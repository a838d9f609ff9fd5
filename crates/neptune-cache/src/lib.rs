//! # neptune-cache
//!
//! Key/value cache drivers.
//!
//! Cache backends sit next to the SQL drivers of `neptune-sql-core` and share
//! their configuration model, but they do not prepare queries: they store,
//! fetch and delete values through [`CacheDriver`].
//!
//! - [`MemcachedDriver`] talks to a memcached server over its text protocol.
//! - [`MemoryCache`] keeps values in the process.
//!
//! Both prefix every key with the configured namespace. Use `unprefixed()`
//! to address raw keys.
//!
//! ```rust
//! use neptune_cache::{CacheDriver, MemoryCache};
//! use std::time::Duration;
//!
//! let cache = MemoryCache::new("app:");
//! cache.set("greeting", b"hello", Some(Duration::from_secs(60)))?;
//!
//! assert_eq!(cache.get("greeting")?, Some(b"hello".to_vec()));
//! assert_eq!(cache.unprefixed().get("app:greeting")?, Some(b"hello".to_vec()));
//! assert!(!cache.add("greeting", b"again", None)?);
//! # Ok::<(), neptune_cache::CacheError>(())
//! ```

mod driver;
pub mod error;
mod memcached;
mod memory;
pub mod protocol;
mod transport;

pub use driver::CacheDriver;
pub use error::{CacheError, Result};
pub use memcached::MemcachedDriver;
pub use memory::MemoryCache;
