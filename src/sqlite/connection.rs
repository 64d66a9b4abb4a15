use std::ops::Deref;
use std::sync::{Arc, MutexGuard};

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::driver::{Connection, PreparedStatement, RowCursor};
use crate::error::DriverError;
use crate::results::DbRow;

use super::params::{json_to_sqlite_value, timestamp_to_sqlite_value};
use super::query::sqlite_extract_row;

/// Connection handed out by the `SQLite` data sources.
///
/// An owned connection is closed on drop; a shared one unlocks its mutex.
#[derive(Debug)]
pub enum SqliteConnection<'p> {
    Owned(rusqlite::Connection),
    Shared(MutexGuard<'p, rusqlite::Connection>),
}

impl Deref for SqliteConnection<'_> {
    type Target = rusqlite::Connection;

    fn deref(&self) -> &rusqlite::Connection {
        match self {
            SqliteConnection::Owned(conn) => conn,
            SqliteConnection::Shared(guard) => &**guard,
        }
    }
}

impl Connection for SqliteConnection<'_> {
    type Statement<'c>
        = SqliteStatement<'c>
    where
        Self: 'c;

    fn prepare(&mut self, sql: &str) -> Result<SqliteStatement<'_>, DriverError> {
        let conn: &rusqlite::Connection = self;
        let stmt = conn.prepare(sql)?;
        let column_names = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        Ok(SqliteStatement {
            stmt,
            column_names: Arc::new(column_names),
        })
    }
}

/// Prepared `SQLite` statement; finalized on drop.
pub struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    column_names: Arc<Vec<String>>,
}

impl SqliteStatement<'_> {
    fn bind(&mut self, position: usize, value: Value) -> Result<(), DriverError> {
        self.stmt.raw_bind_parameter(position, value)?;
        Ok(())
    }
}

impl PreparedStatement for SqliteStatement<'_> {
    type Rows<'s>
        = SqliteRows<'s>
    where
        Self: 's;

    fn parameter_count(&self) -> Option<usize> {
        Some(self.stmt.parameter_count())
    }

    fn bind_int(&mut self, position: usize, value: i64) -> Result<(), DriverError> {
        self.bind(position, Value::Integer(value))
    }

    fn bind_float(&mut self, position: usize, value: f64) -> Result<(), DriverError> {
        self.bind(position, Value::Real(value))
    }

    fn bind_text(&mut self, position: usize, value: &str) -> Result<(), DriverError> {
        self.bind(position, Value::Text(value.to_string()))
    }

    fn bind_null(&mut self, position: usize) -> Result<(), DriverError> {
        self.bind(position, Value::Null)
    }

    fn bind_blob(&mut self, position: usize, value: &[u8]) -> Result<(), DriverError> {
        self.bind(position, Value::Blob(value.to_vec()))
    }

    fn bind_timestamp(
        &mut self,
        position: usize,
        value: &NaiveDateTime,
    ) -> Result<(), DriverError> {
        self.bind(position, timestamp_to_sqlite_value(value))
    }

    fn bind_json(&mut self, position: usize, value: &JsonValue) -> Result<(), DriverError> {
        self.bind(position, json_to_sqlite_value(value))
    }

    fn execute_update(&mut self) -> Result<u64, DriverError> {
        let affected = self.stmt.raw_execute()?;
        u64::try_from(affected)
            .map_err(|e| DriverError::Other(format!("affected row count overflow: {e}")))
    }

    /// Steps the statement once so that failures raised while running it
    /// surface here rather than on the first read.
    fn execute_query(&mut self) -> Result<SqliteRows<'_>, DriverError> {
        let column_names = Arc::clone(&self.column_names);
        let mut rows = self.stmt.raw_query();
        let pending = match rows.next()? {
            Some(row) => Some(DbRow::new(
                Arc::clone(&column_names),
                sqlite_extract_row(row, column_names.len())?,
            )),
            None => None,
        };
        Ok(SqliteRows {
            rows,
            column_names,
            pending,
        })
    }
}

/// Cursor over a running `SQLite` query; resets its statement on drop.
pub struct SqliteRows<'s> {
    rows: rusqlite::Rows<'s>,
    column_names: Arc<Vec<String>>,
    // first row, already stepped by `execute_query`
    pending: Option<DbRow>,
}

impl RowCursor for SqliteRows<'_> {
    fn next_row(&mut self) -> Result<Option<DbRow>, DriverError> {
        if let Some(row) = self.pending.take() {
            return Ok(Some(row));
        }
        match self.rows.next()? {
            Some(row) => {
                let values = sqlite_extract_row(row, self.column_names.len())?;
                Ok(Some(DbRow::new(Arc::clone(&self.column_names), values)))
            }
            None => Ok(None),
        }
    }
}
