//! Seam between [`crate::SqlTemplate`] and a concrete database driver.
//!
//! Every handle here releases its resource when dropped. A statement borrows
//! its connection and a cursor borrows its statement, so the borrow checker
//! fixes the release order to cursor, then statement, then connection.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::DriverError;
use crate::results::DbRow;

/// Hands out live connections. Pooling and connection lifetime policy belong
/// to the implementor.
pub trait ConnectionProvider {
    type Connection<'p>: Connection
    where
        Self: 'p;

    /// Acquire a connection for the duration of one template call.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if no usable connection can be supplied.
    fn acquire(&self) -> Result<Self::Connection<'_>, DriverError>;
}

pub trait Connection {
    type Statement<'c>: PreparedStatement
    where
        Self: 'c;

    /// Prepare `sql` on this connection.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the driver rejects the statement.
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement<'_>, DriverError>;
}

/// A prepared statement with 1-based positional placeholders.
///
/// Setters a driver cannot honour keep the default body, which reports
/// [`DriverError::UnsupportedType`].
pub trait PreparedStatement {
    type Rows<'s>: RowCursor
    where
        Self: 's;

    /// Number of placeholders, when the driver can tell.
    fn parameter_count(&self) -> Option<usize> {
        None
    }

    fn bind_int(&mut self, position: usize, value: i64) -> Result<(), DriverError>;

    fn bind_float(&mut self, position: usize, value: f64) -> Result<(), DriverError>;

    fn bind_text(&mut self, position: usize, value: &str) -> Result<(), DriverError>;

    fn bind_null(&mut self, position: usize) -> Result<(), DriverError>;

    fn bind_bool(&mut self, position: usize, value: bool) -> Result<(), DriverError> {
        self.bind_int(position, i64::from(value))
    }

    fn bind_blob(&mut self, _position: usize, _value: &[u8]) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedType("blob"))
    }

    fn bind_timestamp(
        &mut self,
        _position: usize,
        _value: &NaiveDateTime,
    ) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedType("timestamp"))
    }

    fn bind_json(&mut self, _position: usize, _value: &JsonValue) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedType("json"))
    }

    /// Run the statement as a mutation and report the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if execution fails.
    fn execute_update(&mut self) -> Result<u64, DriverError>;

    /// Run the statement as a query and open a cursor over its rows.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if execution fails.
    fn execute_query(&mut self) -> Result<Self::Rows<'_>, DriverError>;
}

/// Forward-only cursor over a query result.
pub trait RowCursor {
    /// Advance to the next row, `None` once the result is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the row cannot be read.
    fn next_row(&mut self) -> Result<Option<DbRow>, DriverError>;
}
