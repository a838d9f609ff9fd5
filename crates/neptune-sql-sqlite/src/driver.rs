//! SQLite driver over a single `sqlx` connection.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use neptune_sql_core::{
    Driver, DriverBuilders, DriverConfig, InsertId, QueryError, Result, SqlValue, Statement,
};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Executor, Sqlite};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::formatter::SqliteFormatter;

const DRIVER: &str = "sqlite";

/// State shared by a driver and the statements it hands out.
struct Session {
    runtime: Runtime,
    conn: Mutex<SqliteConnection>,
    last_rowid: AtomicI64,
    executed: Mutex<Option<String>>,
}

impl Session {
    fn conn(&self) -> MutexGuard<'_, SqliteConnection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn executed(&self) -> MutexGuard<'_, Option<String>> {
        self.executed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Driver backed by one SQLite connection.
///
/// The connection is opened when the driver is built and lives as long as
/// the driver and its statements. Calls block on a private current-thread
/// runtime, so they must not be made from inside another tokio runtime.
pub struct SqliteDriver {
    session: Arc<Session>,
    builder: RwLock<String>,
    prepared: Mutex<Option<String>>,
}

impl SqliteDriver {
    /// Opens the database named by the `database` key.
    ///
    /// The value may be a `sqlite:` URL, a file path (created if missing) or
    /// `:memory:`.
    ///
    /// # Errors
    ///
    /// Missing or non-string `database` fails before any I/O. Connection
    /// failures are returned as [`QueryError::Backend`] wrapping `sqlx::Error`.
    pub fn connect(config: &DriverConfig) -> Result<Self> {
        let database = config.get_str(DRIVER, "database")?;
        let options = SqliteConnectOptions::from_str(database)
            .map_err(QueryError::backend)?
            .create_if_missing(true);

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let conn = runtime
            .block_on(options.connect())
            .map_err(QueryError::backend)?;
        info!(database, "SQLite connection opened");

        let driver = Self {
            session: Arc::new(Session {
                runtime,
                conn: Mutex::new(conn),
                last_rowid: AtomicI64::new(0),
                executed: Mutex::new(None),
            }),
            builder: RwLock::new(SqliteFormatter::NAME.to_string()),
            prepared: Mutex::new(None),
        };
        if let Some(builder) = config.get_opt_str("builder") {
            driver.set_builder_name(builder);
        }
        Ok(driver)
    }

    /// Runs `sql` directly, outside any statement. Returns the rows affected.
    ///
    /// # Errors
    ///
    /// SQLite errors, unchanged.
    pub fn execute_raw(&self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "Executing raw SQL");
        let session = &self.session;
        let mut conn = session.conn();
        let done = session
            .runtime
            .block_on((&mut *conn).execute(sql))
            .map_err(QueryError::backend)?;
        Ok(done.rows_affected())
    }

    fn prepared(&self) -> MutexGuard<'_, Option<String>> {
        self.prepared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("builder", &self.builder_name())
            .field("prepared_query", &self.prepared_query())
            .finish_non_exhaustive()
    }
}

impl Driver for SqliteDriver {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
        {
            let mut conn = self.session.conn();
            self.session
                .runtime
                .block_on((&mut *conn).prepare(sql))
                .map_err(QueryError::backend)?;
        }
        debug!(sql = %sql, "SQLite statement prepared");
        *self.prepared() = Some(sql.to_string());

        Ok(Box::new(SqliteStatement {
            sql: sql.to_string(),
            session: Arc::clone(&self.session),
            executed: None,
        }))
    }

    fn quote(&self, value: &SqlValue) -> String {
        value.to_sql_inline()
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
        *self.prepared() = None;
        *self.session.executed() = None;
    }

    fn prepared_query(&self) -> Option<String> {
        self.prepared().clone()
    }

    fn executed_query(&self) -> Option<String> {
        self.session.executed().clone()
    }

    /// SQLite keeps one rowid per connection, so `column` is ignored.
    fn last_insert_id(&self, _column: Option<&str>) -> Result<InsertId> {
        Ok(InsertId::Id(self.session.last_rowid.load(Ordering::SeqCst)))
    }
}

/// Statement prepared by [`SqliteDriver`].
pub struct SqliteStatement {
    sql: String,
    session: Arc<Session>,
    executed: Option<String>,
}

impl fmt::Debug for SqliteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStatement")
            .field("sql", &self.sql)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}

impl Statement for SqliteStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn execute(&mut self, params: &[SqlValue]) -> Result<u64> {
        let query = params
            .iter()
            .fold(sqlx::query(&self.sql), |query, param| bind_param(query, param));

        let session = &self.session;
        let mut conn = session.conn();
        let done = session
            .runtime
            .block_on(query.execute(&mut *conn))
            .map_err(QueryError::backend)?;
        drop(conn);

        session
            .last_rowid
            .store(done.last_insert_rowid(), Ordering::SeqCst);
        *session.executed() = Some(self.sql.clone());
        self.executed = Some(self.sql.clone());
        debug!(
            sql = %self.sql,
            rows_affected = done.rows_affected(),
            "SQLite statement executed"
        );
        Ok(done.rows_affected())
    }

    fn executed_query(&self) -> Option<String> {
        self.executed.clone()
    }
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

/// Adds the `sqlite` driver kind to `builders`.
pub fn register(builders: &mut DriverBuilders) -> &mut DriverBuilders {
    builders.register(DRIVER, |config| {
        Ok(Arc::new(SqliteDriver::connect(config)?) as Arc<dyn Driver>)
    })
}
