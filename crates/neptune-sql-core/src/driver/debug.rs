//! Driver that records queries instead of running them.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use super::{Driver, InsertId, Statement};
use crate::config::DriverConfig;
use crate::error::Result;
use crate::events::{Event, EventSink, TracingSink};
use crate::formatter::GenericFormatter;
use crate::value::{PLACEHOLDER, SqlValue};

type ExecutedSlot = Arc<Mutex<Option<String>>>;

#[derive(Default)]
struct DebugState {
    query: Option<String>,
    statement: Option<ExecutedSlot>,
}

/// A no-op backend.
///
/// Every prepare emits a [`QUERY_EVENT`](crate::events::QUERY_EVENT) with the
/// query text and records it; statements record what they would have run.
pub struct DebugDriver {
    builder: RwLock<String>,
    sink: Arc<dyn EventSink>,
    state: Mutex<DebugState>,
}

impl DebugDriver {
    /// Creates a debug driver reporting events to `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Creates a debug driver reporting events to `sink`.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            builder: RwLock::new(GenericFormatter::NAME.to_string()),
            sink,
            state: Mutex::new(DebugState::default()),
        }
    }

    /// Creates a debug driver from configuration.
    ///
    /// Connection settings such as host or credentials are accepted and
    /// ignored; nothing is required.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other driver constructors.
    pub fn from_config(config: &DriverConfig) -> Result<Self> {
        let driver = Self::new();
        if let Some(builder) = config.get_opt_str("builder") {
            driver.set_builder_name(builder);
        }
        Ok(driver)
    }

    /// Backslash-escapes quotes, backslashes and NUL, then wraps in single quotes.
    #[must_use]
    pub fn quote_value(value: &SqlValue) -> String {
        if value.is_null() {
            return String::from("NULL");
        }
        let text = value.to_plain_text();
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('\'');
        for c in text.chars() {
            match c {
                '\'' | '"' | '\\' => {
                    quoted.push('\\');
                    quoted.push(c);
                }
                '\0' => quoted.push_str("\\0"),
                _ => quoted.push(c),
            }
        }
        quoted.push('\'');
        quoted
    }

    fn state(&self) -> std::sync::MutexGuard<'_, DebugState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DebugDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DebugDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugDriver")
            .field("builder", &self.builder_name())
            .field("prepared_query", &self.prepared_query())
            .finish_non_exhaustive()
    }
}

impl Driver for DebugDriver {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
        self.sink.emit(Event::query(sql));

        let executed: ExecutedSlot = Arc::new(Mutex::new(None));
        let mut state = self.state();
        state.query = Some(sql.to_string());
        state.statement = Some(Arc::clone(&executed));
        drop(state);

        Ok(Box::new(DebugStatement {
            sql: sql.to_string(),
            executed,
        }))
    }

    fn quote(&self, value: &SqlValue) -> String {
        Self::quote_value(value)
    }

    fn builder_name(&self) -> String {
        self.builder
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_builder_name(&self, name: &str) {
        *self.builder.write().unwrap_or_else(PoisonError::into_inner) = name.to_string();
    }

    fn reset(&self) {
        *self.state() = DebugState::default();
    }

    fn prepared_query(&self) -> Option<String> {
        self.state().query.clone()
    }

    fn executed_query(&self) -> Option<String> {
        let slot = self.state().statement.clone()?;
        let executed = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        executed
    }

    fn last_insert_id(&self, _column: Option<&str>) -> Result<InsertId> {
        Ok(InsertId::Acknowledged)
    }
}

/// Statement produced by [`DebugDriver`].
///
/// Executing it records the query with every `?` replaced by the quoted
/// parameter, and touches no database.
#[derive(Debug)]
pub struct DebugStatement {
    sql: String,
    executed: ExecutedSlot,
}

impl DebugStatement {
    /// Replaces each `?` outside quoted literals with the next parameter.
    fn interpolate(&self, params: &[SqlValue]) -> String {
        let mut params = params.iter();
        let mut text = String::with_capacity(self.sql.len());
        let mut in_literal = false;
        let mut chars = self.sql.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' if in_literal => {
                    text.push(c);
                    text.extend(chars.next());
                }
                '\'' => {
                    in_literal = !in_literal;
                    text.push(c);
                }
                '?' if !in_literal => match params.next() {
                    Some(param) => text.push_str(&DebugDriver::quote_value(param)),
                    None => text.push_str(PLACEHOLDER),
                },
                _ => text.push(c),
            }
        }
        text
    }
}

impl Statement for DebugStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn execute(&mut self, params: &[SqlValue]) -> Result<u64> {
        let text = self.interpolate(params);
        debug!(sql = %text, "Debug statement executed");
        *self.executed.lock().unwrap_or_else(PoisonError::into_inner) = Some(text);
        Ok(0)
    }

    fn executed_query(&self) -> Option<String> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectorSink, QUERY_EVENT};
    use crate::value::ToSqlValue;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(DebugDriver::quote_value(&1_i32.to_sql_value()), "'1'");
        assert_eq!(DebugDriver::quote_value(&"it's".to_sql_value()), "'it\\'s'");
        assert_eq!(
            DebugDriver::quote_value(&"say \"hi\" \\o/".to_sql_value()),
            "'say \\\"hi\\\" \\\\o/'"
        );
        assert_eq!(DebugDriver::quote_value(&"a\0b".to_sql_value()), "'a\\0b'");
        assert_eq!(DebugDriver::quote_value(&SqlValue::Null), "NULL");
    }

    #[test]
    fn test_prepare_emits_query_event() {
        let sink = Arc::new(CollectorSink::default());
        let driver = DebugDriver::with_sink(sink.clone());

        driver.prepare("SELECT * FROM users").unwrap();

        assert_eq!(sink.payloads(QUERY_EVENT), vec!["SELECT * FROM users"]);
        assert_eq!(driver.prepared_query().as_deref(), Some("SELECT * FROM users"));
    }

    #[test]
    fn test_executed_query_after_execute() {
        let driver = DebugDriver::new();
        let mut statement = driver
            .prepare("UPDATE users SET name = ? WHERE id = ?")
            .unwrap();
        assert_eq!(driver.executed_query(), None);
        assert_eq!(statement.executed_query(), None);

        let affected = statement
            .execute(&["Bob".to_sql_value(), 3_i32.to_sql_value()])
            .unwrap();

        assert_eq!(affected, 0);
        assert_eq!(
            driver.executed_query().as_deref(),
            Some("UPDATE users SET name = 'Bob' WHERE id = '3'")
        );
        assert_eq!(statement.executed_query(), driver.executed_query());
    }

    #[test]
    fn test_missing_params_keep_placeholder() {
        let driver = DebugDriver::new();
        let mut statement = driver.prepare("INSERT INTO t (a, b) VALUES (?, ?)").unwrap();
        statement.execute(&[1_i32.to_sql_value()]).unwrap();
        assert_eq!(
            statement.executed_query().as_deref(),
            Some("INSERT INTO t (a, b) VALUES ('1', ?)")
        );
    }

    #[test]
    fn test_question_mark_inside_literal_is_not_a_placeholder() {
        let driver = DebugDriver::new();
        let mut statement = driver
            .prepare("SELECT * FROM t WHERE title = 'why?' AND note = 'it\\'s ?' AND id = ?")
            .unwrap();
        statement.execute(&[5_i32.to_sql_value()]).unwrap();
        assert_eq!(
            statement.executed_query().as_deref(),
            Some("SELECT * FROM t WHERE title = 'why?' AND note = 'it\\'s ?' AND id = '5'")
        );
    }

    #[test]
    fn test_reset_clears_state() {
        let driver = DebugDriver::new();
        let mut statement = driver.prepare("DELETE FROM t").unwrap();
        statement.execute(&[]).unwrap();

        driver.reset();

        assert_eq!(driver.prepared_query(), None);
        assert_eq!(driver.executed_query(), None);
    }

    #[test]
    fn test_builder_name_override() {
        let driver = DebugDriver::new();
        assert_eq!(driver.builder_name(), "generic");
        driver.set_builder_name("sqlite");
        assert_eq!(driver.builder_name(), "sqlite");

        let configured =
            DebugDriver::from_config(&DriverConfig::new().with("builder", "sqlite")).unwrap();
        assert_eq!(configured.builder_name(), "sqlite");
    }

    #[test]
    fn test_last_insert_id_always_acknowledged() {
        let driver = DebugDriver::new();
        assert_eq!(driver.last_insert_id(None).unwrap(), InsertId::Acknowledged);
        assert_eq!(driver.last_insert_id(Some("id")).unwrap(), InsertId::Acknowledged);
    }
}
