//! Error types for cache drivers.

use neptune_sql_core::ConfigError;
use thiserror::Error;

/// Cache driver errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The driver was constructed with missing or invalid settings.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection or could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server sent something that is not a memcached reply.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// `ERROR`, `CLIENT_ERROR` or `SERVER_ERROR` reply.
    #[error("server error: {0}")]
    Server(String),

    /// Keys must be 1 to 250 bytes without whitespace or control characters.
    #[error("invalid cache key '{0}'")]
    InvalidKey(String),

    #[error("timed out waiting for the cache server")]
    Timeout,

    /// The blocking runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(#[source] std::io::Error),

    /// The buffer holds only part of a reply.
    #[error("incomplete reply")]
    Incomplete,
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
