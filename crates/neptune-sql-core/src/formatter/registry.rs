//! Formatter lookup by tag.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Formatter, GenericFormatter};
use crate::error::{QueryError, Result};

/// Maps the tags drivers report to formatter instances.
///
/// Swapping the formatter registered under a tag changes the dialect of
/// every query built for drivers reporting that tag, without touching call
/// sites.
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn Formatter>>,
}

impl FormatterRegistry {
    /// Creates a registry holding the generic formatter.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(GenericFormatter::new()));
        registry
    }

    /// Creates a registry with no formatter at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            formatters: HashMap::new(),
        }
    }

    /// Registers `formatter` under its own name.
    pub fn register(&mut self, formatter: Arc<dyn Formatter>) -> &mut Self {
        self.register_as(formatter.name(), formatter)
    }

    /// Registers `formatter` under `tag`, replacing any previous entry.
    pub fn register_as(&mut self, tag: impl Into<String>, formatter: Arc<dyn Formatter>) -> &mut Self {
        self.formatters.insert(tag.into(), formatter);
        self
    }

    /// Returns the formatter registered under `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownFormatter`] for unregistered tags.
    pub fn resolve(&self, tag: &str) -> Result<Arc<dyn Formatter>> {
        self.formatters
            .get(tag)
            .cloned()
            .ok_or_else(|| QueryError::UnknownFormatter(tag.to_string()))
    }

    /// Returns whether `tag` is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.formatters.contains_key(tag)
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("FormatterRegistry").field("tags", &tags).finish()
    }
}
