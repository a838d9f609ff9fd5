//! Error types for query building and driver access.

use thiserror::Error;

use crate::config::ConfigError;
use crate::query::{Clause, QueryKind};

/// Errors raised while resolving drivers, formatting queries or preparing them.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A driver was constructed with missing or invalid settings.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// No driver is registered under the requested name.
    #[error("no database driver registered as '{0}'")]
    UnresolvedDriver(String),

    /// A driver reported a formatter tag that nobody registered.
    #[error("no query formatter registered for '{0}'")]
    UnknownFormatter(String),

    /// The query lacks a clause its kind cannot be formatted without.
    #[error("malformed {kind} query: missing {clause} clause")]
    MalformedQuery {
        /// Kind of the query being formatted.
        kind: QueryKind,
        /// The mandatory clause that was never set.
        clause: Clause,
    },

    /// Error reported by the backend itself, passed through untouched.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    /// The blocking runtime behind a network driver could not be started.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl QueryError {
    /// Wraps a backend error without altering it.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    /// Check if this is a malformed query error
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedQuery { .. })
    }

    /// Returns the backend error when it is of type `E`.
    #[must_use]
    pub fn backend_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Backend(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
