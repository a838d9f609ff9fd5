//! Memcached backend.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use neptune_sql_core::DriverConfig;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, trace};

use crate::driver::{CacheDriver, KeyPrefix};
use crate::error::{CacheError, Result};
use crate::protocol::{self, Command, Reply, StoreMode};
use crate::transport::Transport;

const DRIVER: &str = "memcached";

/// Server address plus the lazily opened connection to it.
struct Connection {
    host: String,
    port: u16,
    timeout: Option<Duration>,
    runtime: Runtime,
    transport: Mutex<Option<Transport>>,
}

impl Connection {
    /// Sends `command`, connecting first if needed.
    ///
    /// A failed request drops the connection; the next request reconnects.
    fn request(&self, command: &Command<'_>) -> Result<Reply> {
        let mut slot = self
            .transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.runtime.block_on(async {
            let exchange = async {
                let mut transport = match slot.take() {
                    Some(transport) => transport,
                    None => {
                        let transport = Transport::connect(&self.host, self.port).await?;
                        info!(host = %self.host, port = self.port, "Connected to memcached");
                        transport
                    }
                };
                let reply = transport.request(command).await?;
                *slot = Some(transport);
                Ok::<_, CacheError>(reply)
            };
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .unwrap_or(Err(CacheError::Timeout)),
                None => exchange.await,
            }
        })
    }
}

/// Cache driver speaking the memcached text protocol.
///
/// Construction only validates the configuration; the TCP connection is
/// opened by the first operation. Calls block on a private current-thread
/// runtime, so they must not be made from inside another tokio runtime.
///
/// Cloning is cheap and clones share the connection.
#[derive(Clone)]
pub struct MemcachedDriver {
    connection: Arc<Connection>,
    prefix: KeyPrefix,
}

impl MemcachedDriver {
    /// Creates a driver from the `host`, `port` and `prefix` keys, plus an
    /// optional `timeout` in milliseconds.
    ///
    /// # Errors
    ///
    /// [`CacheError::Configuration`] naming every missing key, before any
    /// network activity.
    pub fn new(config: &DriverConfig) -> Result<Self> {
        config.require(DRIVER, &["host", "port", "prefix"])?;
        let host = config.get_str(DRIVER, "host")?.to_string();
        let port = config.get_u16(DRIVER, "port")?;
        let prefix = config.get_str(DRIVER, "prefix")?;
        let timeout = if config.contains("timeout") {
            Some(Duration::from_millis(u64::from(
                config.get_u32(DRIVER, "timeout")?,
            )))
        } else {
            None
        };

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CacheError::Runtime)?;
        debug!(host = %host, port, prefix, "Memcached driver configured");

        Ok(Self {
            connection: Arc::new(Connection {
                host,
                port,
                timeout,
                runtime,
                transport: Mutex::new(None),
            }),
            prefix: KeyPrefix::new(prefix),
        })
    }

    /// Returns a view of the same server that uses keys as given.
    #[must_use]
    pub fn unprefixed(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            prefix: self.prefix.disabled(),
        }
    }

    /// Returns the configured key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    fn key(&self, key: &str) -> Result<String> {
        let key = self.prefix.apply(key);
        protocol::validate_key(&key)?;
        Ok(key)
    }

    fn store(&self, mode: StoreMode, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        let key = self.key(key)?;
        let command = Command::Store {
            mode,
            key: &key,
            exptime: protocol::exptime(ttl),
            data: value,
        };
        match self.connection.request(&command)? {
            Reply::Stored => Ok(true),
            Reply::NotStored | Reply::Exists => Ok(false),
            reply => Err(unexpected(&command, reply)),
        }
    }
}

impl fmt::Debug for MemcachedDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemcachedDriver")
            .field("host", &self.connection.host)
            .field("port", &self.connection.port)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl CacheDriver for MemcachedDriver {
    fn add(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        self.store(StoreMode::Add, key, value, ttl)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        self.store(StoreMode::Set, key, value, ttl)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = self.key(key)?;
        let command = Command::Get { key: &key };
        match self.connection.request(&command)? {
            Reply::Values(items) => {
                let value = items
                    .into_iter()
                    .find(|item| item.key == key)
                    .map(|item| item.data);
                trace!(key = %key, hit = value.is_some(), "Cache lookup");
                Ok(value)
            }
            reply => Err(unexpected(&command, reply)),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let key = self.key(key)?;
        let command = Command::Delete { key: &key };
        match self.connection.request(&command)? {
            Reply::Deleted => Ok(true),
            Reply::NotFound => Ok(false),
            reply => Err(unexpected(&command, reply)),
        }
    }

    fn flush(&self, delay: Option<Duration>) -> Result<()> {
        let command = Command::FlushAll {
            delay: delay.map(|delay| delay.as_secs()),
        };
        match self.connection.request(&command)? {
            Reply::Ok => Ok(()),
            reply => Err(unexpected(&command, reply)),
        }
    }
}

fn unexpected(command: &Command<'_>, reply: Reply) -> CacheError {
    match reply {
        Reply::Error => CacheError::Server(format!("{} rejected by server", command.name())),
        Reply::ClientError(message) | Reply::ServerError(message) => CacheError::Server(message),
        other => CacheError::Protocol(format!("unexpected reply to {}: {other:?}", command.name())),
    }
}
