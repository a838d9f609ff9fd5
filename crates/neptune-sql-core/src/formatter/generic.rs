//! Generic SQL dialect.

use super::Formatter;

/// ANSI-style formatter. Every fragment uses the trait defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericFormatter;

impl GenericFormatter {
    /// Tag under which the generic formatter is registered.
    pub const NAME: &'static str = "generic";

    /// Creates a new generic formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Formatter for GenericFormatter {
    fn name(&self) -> &'static str {
        Self::NAME
    }
}
