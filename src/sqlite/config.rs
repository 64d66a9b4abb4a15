use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};

use crate::driver::ConnectionProvider;
use crate::error::DriverError;

use super::connection::SqliteConnection;

/// Options applied to every `SQLite` connection a data source opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteOptions {
    pub db_path: String,
    pub read_only: bool,
    pub busy_timeout_ms: Option<u64>,
    pub foreign_keys: bool,
    pub journal_mode_wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self::new(":memory:".to_string())
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            read_only: false,
            busy_timeout_ms: None,
            foreign_keys: true,
            journal_mode_wal: false,
        }
    }

    #[must_use]
    pub fn builder(db_path: String) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    fn open_flags(&self) -> OpenFlags {
        if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        }
    }

    /// Open a connection and apply the configured pragmas.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the file cannot be opened or a pragma fails.
    pub fn open(&self) -> Result<rusqlite::Connection, DriverError> {
        let conn = rusqlite::Connection::open_with_flags(&self.db_path, self.open_flags())?;
        if let Some(ms) = self.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }
        if self.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        if self.journal_mode_wal && !self.read_only {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        Ok(conn)
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn wal(mut self, enabled: bool) -> Self {
        self.opts.journal_mode_wal = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a data source that opens one connection per call.
    #[must_use]
    pub fn build(self) -> SqliteDataSource {
        SqliteDataSource::new(self.finish())
    }
}

/// Opens a fresh connection for every acquire; it is closed when the call
/// releases it.
#[derive(Debug, Clone)]
pub struct SqliteDataSource {
    opts: SqliteOptions,
}

impl SqliteDataSource {
    #[must_use]
    pub fn new(opts: SqliteOptions) -> Self {
        Self { opts }
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }
}

impl ConnectionProvider for SqliteDataSource {
    type Connection<'p> = SqliteConnection<'p>;

    fn acquire(&self) -> Result<SqliteConnection<'_>, DriverError> {
        tracing::debug!(db_path = %self.opts.db_path, "opening sqlite connection");
        Ok(SqliteConnection::Owned(self.opts.open()?))
    }
}

/// Shares one connection between calls, one call at a time.
///
/// Suited to `:memory:` databases, where every fresh connection would see an
/// empty database. A caller that panicked while holding the connection does
/// not lock out later callers.
#[derive(Debug)]
pub struct SingleConnectionDataSource {
    conn: Mutex<rusqlite::Connection>,
}

impl SingleConnectionDataSource {
    #[must_use]
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open the connection described by `opts` and share it.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the connection cannot be opened.
    pub fn open(opts: &SqliteOptions) -> Result<Self, DriverError> {
        Ok(Self::new(opts.open()?))
    }

    /// Run setup SQL (schema, seed data) directly on the shared connection.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the batch fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DriverError> {
        self.lock().execute_batch(sql)?;
        Ok(())
    }

    // A holder that panicked mid-call has already dropped its statement and
    // cursor, which resets them, so the connection stays usable.
    fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("sqlite connection lock poisoned by a panicked caller; recovering");
            self.conn.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Take the connection back, even if a previous holder panicked.
    #[must_use]
    pub fn into_inner(self) -> rusqlite::Connection {
        self.conn.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionProvider for SingleConnectionDataSource {
    type Connection<'p> = SqliteConnection<'p>;

    fn acquire(&self) -> Result<SqliteConnection<'_>, DriverError> {
        Ok(SqliteConnection::Shared(self.lock()))
    }
}
