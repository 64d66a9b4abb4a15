//! Recording in-memory driver.
//!
//! Every handle logs what happens to it (including its release on drop) to a
//! shared event log, so tests can check binding order, release counts and
//! release order without a real database.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::driver::{Connection, ConnectionProvider, PreparedStatement, RowCursor};
use crate::error::DriverError;
use crate::results::DbRow;
use crate::types::RowValues;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Acquire,
    Prepare(String),
    Bind(usize, RowValues),
    ExecuteUpdate,
    ExecuteQuery,
    CloseRows,
    CloseStatement,
    CloseConnection,
}

#[derive(Debug, Clone, Default)]
struct Script {
    fail_acquire: bool,
    fail_prepare: bool,
    fail_execute: bool,
    fail_read_at: Option<usize>,
    fail_bind_at: Option<usize>,
    columns: Arc<Vec<String>>,
    rows: Vec<Vec<RowValues>>,
    affected: u64,
    parameter_count: Option<usize>,
    unsupported: Vec<&'static str>,
}

type EventLog = Arc<Mutex<Vec<Event>>>;

fn record(log: &EventLog, event: Event) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event);
}

/// Scripted connection provider.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    script: Arc<Script>,
    log: EventLog,
}

impl MockDataSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(mut self, f: impl FnOnce(&mut Script)) -> Self {
        f(Arc::make_mut(&mut self.script));
        self
    }

    /// Rows every query returns, in cursor order.
    #[must_use]
    pub fn with_rows(self, columns: &[&str], rows: Vec<Vec<RowValues>>) -> Self {
        let columns = Arc::new(columns.iter().map(ToString::to_string).collect());
        self.edit(|s| {
            s.columns = columns;
            s.rows = rows;
        })
    }

    #[must_use]
    pub fn with_affected_rows(self, affected: u64) -> Self {
        self.edit(|s| s.affected = affected)
    }

    #[must_use]
    pub fn with_parameter_count(self, count: usize) -> Self {
        self.edit(|s| s.parameter_count = Some(count))
    }

    /// Make the named setter (`"blob"`, `"json"`, ...) report an unsupported type.
    #[must_use]
    pub fn without_support_for(self, type_name: &'static str) -> Self {
        self.edit(|s| s.unsupported.push(type_name))
    }

    #[must_use]
    pub fn failing_acquire(self) -> Self {
        self.edit(|s| s.fail_acquire = true)
    }

    #[must_use]
    pub fn failing_prepare(self) -> Self {
        self.edit(|s| s.fail_prepare = true)
    }

    #[must_use]
    pub fn failing_execute(self) -> Self {
        self.edit(|s| s.fail_execute = true)
    }

    /// Make the setter for 1-based `position` fail with a driver error.
    #[must_use]
    pub fn failing_bind_at(self, position: usize) -> Self {
        self.edit(|s| s.fail_bind_at = Some(position))
    }

    /// Make reading the row at `row_num` fail.
    #[must_use]
    pub fn failing_read_at(self, row_num: usize) -> Self {
        self.edit(|s| s.fail_read_at = Some(row_num))
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    /// Events describing resource acquisition and release only.
    #[must_use]
    pub fn lifecycle(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::Acquire
                        | Event::CloseRows
                        | Event::CloseStatement
                        | Event::CloseConnection
                )
            })
            .collect()
    }
}

impl ConnectionProvider for MockDataSource {
    type Connection<'p> = MockConnection;

    fn acquire(&self) -> Result<MockConnection, DriverError> {
        if self.script.fail_acquire {
            return Err(DriverError::ConnectionError(
                "mock: no connection available".into(),
            ));
        }
        record(&self.log, Event::Acquire);
        Ok(MockConnection {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        })
    }
}

#[derive(Debug)]
pub struct MockConnection {
    script: Arc<Script>,
    log: EventLog,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        record(&self.log, Event::CloseConnection);
    }
}

impl Connection for MockConnection {
    type Statement<'c> = MockStatement;

    fn prepare(&mut self, sql: &str) -> Result<MockStatement, DriverError> {
        if self.script.fail_prepare {
            return Err(DriverError::Other(format!("mock: cannot prepare `{sql}`")));
        }
        record(&self.log, Event::Prepare(sql.to_string()));
        Ok(MockStatement {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        })
    }
}

#[derive(Debug)]
pub struct MockStatement {
    script: Arc<Script>,
    log: EventLog,
}

impl MockStatement {
    fn bind(&mut self, position: usize, value: RowValues) -> Result<(), DriverError> {
        let type_name = value.type_name();
        if self.script.unsupported.contains(&type_name) {
            return Err(DriverError::UnsupportedType(type_name));
        }
        if self.script.fail_bind_at == Some(position) {
            return Err(DriverError::Other(format!(
                "mock: cannot bind position {position}"
            )));
        }
        record(&self.log, Event::Bind(position, value));
        Ok(())
    }
}

impl Drop for MockStatement {
    fn drop(&mut self) {
        record(&self.log, Event::CloseStatement);
    }
}

impl PreparedStatement for MockStatement {
    type Rows<'s> = MockRows;

    fn parameter_count(&self) -> Option<usize> {
        self.script.parameter_count
    }

    fn bind_int(&mut self, position: usize, value: i64) -> Result<(), DriverError> {
        self.bind(position, RowValues::Int(value))
    }

    fn bind_float(&mut self, position: usize, value: f64) -> Result<(), DriverError> {
        self.bind(position, RowValues::Float(value))
    }

    fn bind_text(&mut self, position: usize, value: &str) -> Result<(), DriverError> {
        self.bind(position, RowValues::Text(value.to_string()))
    }

    fn bind_null(&mut self, position: usize) -> Result<(), DriverError> {
        self.bind(position, RowValues::Null)
    }

    fn bind_bool(&mut self, position: usize, value: bool) -> Result<(), DriverError> {
        self.bind(position, RowValues::Bool(value))
    }

    fn bind_blob(&mut self, position: usize, value: &[u8]) -> Result<(), DriverError> {
        self.bind(position, RowValues::Blob(value.to_vec()))
    }

    fn bind_timestamp(
        &mut self,
        position: usize,
        value: &NaiveDateTime,
    ) -> Result<(), DriverError> {
        self.bind(position, RowValues::Timestamp(*value))
    }

    fn bind_json(&mut self, position: usize, value: &JsonValue) -> Result<(), DriverError> {
        self.bind(position, RowValues::JSON(value.clone()))
    }

    fn execute_update(&mut self) -> Result<u64, DriverError> {
        if self.script.fail_execute {
            return Err(DriverError::Other("mock: execute failed".into()));
        }
        record(&self.log, Event::ExecuteUpdate);
        Ok(self.script.affected)
    }

    fn execute_query(&mut self) -> Result<MockRows, DriverError> {
        if self.script.fail_execute {
            return Err(DriverError::Other("mock: execute failed".into()));
        }
        record(&self.log, Event::ExecuteQuery);
        Ok(MockRows {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
            next: 0,
        })
    }
}

#[derive(Debug)]
pub struct MockRows {
    script: Arc<Script>,
    log: EventLog,
    next: usize,
}

impl Drop for MockRows {
    fn drop(&mut self) {
        record(&self.log, Event::CloseRows);
    }
}

impl RowCursor for MockRows {
    fn next_row(&mut self) -> Result<Option<DbRow>, DriverError> {
        if self.script.fail_read_at == Some(self.next) {
            return Err(DriverError::Other(format!(
                "mock: cannot read row {}",
                self.next
            )));
        }
        let row = self.script.rows.get(self.next).map(|values| {
            DbRow::new(Arc::clone(&self.script.columns), values.clone())
        });
        self.next += 1;
        Ok(row)
    }
}
