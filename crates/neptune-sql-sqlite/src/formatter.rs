//! SQLite dialect formatter.

use neptune_sql_core::Formatter;

/// SQLite formatter.
///
/// Identical to the generic dialect except for row windows: SQLite has no
/// bare `OFFSET`, so an offset without a limit is written `LIMIT -1 OFFSET n`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteFormatter;

impl SqliteFormatter {
    /// Tag reported by [`SqliteDriver`](crate::SqliteDriver).
    pub const NAME: &'static str = "sqlite";

    /// Creates a new SQLite formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Formatter for SqliteFormatter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn limit_sql(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(limit), None) => Some(format!("LIMIT {limit}")),
            (None, Some(offset)) => Some(format!("LIMIT -1 OFFSET {offset}")),
            (Some(limit), Some(offset)) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        }
    }
}
