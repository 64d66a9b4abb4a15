use crate::binder::bind_params;
use crate::driver::{Connection, ConnectionProvider, PreparedStatement, RowCursor};
use crate::error::{BindError, DriverError, Phase, SqlTemplateError};
use crate::mapper::RowMapper;
use crate::types::RowValues;

/// Statement executor over a [`ConnectionProvider`].
///
/// Each call acquires a connection, prepares and binds the statement, runs it
/// and releases everything it opened before returning, on success and on
/// every error path. Handles are released by drop in reverse order of
/// acquisition: cursor, statement, connection.
///
/// Driver errors are logged here and replaced by a [`SqlTemplateError`];
/// the template keeps no state between calls.
#[derive(Debug, Clone)]
pub struct SqlTemplate<P> {
    data_source: P,
}

impl<P: ConnectionProvider> SqlTemplate<P> {
    pub fn new(data_source: P) -> Self {
        Self { data_source }
    }

    #[must_use]
    pub fn data_source(&self) -> &P {
        &self.data_source
    }

    /// Run an INSERT/UPDATE/DELETE and return the driver-reported affected-row count.
    ///
    /// # Errors
    ///
    /// `ConnectionError` if no connection is available, `UnsupportedParameterType`
    /// for an argument the driver cannot bind, `DataAccess` for any other failure.
    pub fn execute(&self, sql: &str, args: &[RowValues]) -> Result<u64, SqlTemplateError> {
        let mut conn = self.acquire()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| data_access(Operation::Update, Phase::Prepare, sql, &e))?;
        bind_params(&mut stmt, args).map_err(|e| bind_failure(Operation::Update, sql, e))?;
        let affected = stmt
            .execute_update()
            .map_err(|e| data_access(Operation::Update, Phase::Execute, sql, &e))?;
        tracing::debug!(sql, affected, "update executed");
        Ok(affected)
    }

    /// Alias of [`SqlTemplate::execute`].
    ///
    /// # Errors
    ///
    /// See [`SqlTemplate::execute`].
    pub fn insert(&self, sql: &str, args: &[RowValues]) -> Result<u64, SqlTemplateError> {
        self.execute(sql, args)
    }

    /// Alias of [`SqlTemplate::execute`].
    ///
    /// # Errors
    ///
    /// See [`SqlTemplate::execute`].
    pub fn update(&self, sql: &str, args: &[RowValues]) -> Result<u64, SqlTemplateError> {
        self.execute(sql, args)
    }

    /// Alias of [`SqlTemplate::execute`].
    ///
    /// # Errors
    ///
    /// See [`SqlTemplate::execute`].
    pub fn delete(&self, sql: &str, args: &[RowValues]) -> Result<u64, SqlTemplateError> {
        self.execute(sql, args)
    }

    /// Run a query and map every row, in cursor order. No rows gives an empty `Vec`.
    ///
    /// # Errors
    ///
    /// `ConnectionError` if no connection is available, `UnsupportedParameterType`
    /// for an argument the driver cannot bind, `DataAccess` for failures while
    /// preparing, binding, executing, reading or mapping.
    pub fn query<T, M>(
        &self,
        sql: &str,
        mapper: M,
        args: &[RowValues],
    ) -> Result<Vec<T>, SqlTemplateError>
    where
        M: RowMapper<T>,
    {
        let mut conn = self.acquire()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| data_access(Operation::Query, Phase::Prepare, sql, &e))?;
        bind_params(&mut stmt, args).map_err(|e| bind_failure(Operation::Query, sql, e))?;
        let mut rows = stmt
            .execute_query()
            .map_err(|e| data_access(Operation::Query, Phase::Execute, sql, &e))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next_row()
            .map_err(|e| data_access(Operation::Query, Phase::Read, sql, &e))?
        {
            let row_num = results.len();
            let value = mapper.map_row(&row, row_num).map_err(|e| {
                tracing::error!(sql, row_num, error = %e, "row mapping failed");
                SqlTemplateError::DataAccess {
                    phase: Phase::Map,
                    message: format!("query failed mapping row {row_num}"),
                }
            })?;
            results.push(value);
        }
        tracing::debug!(sql, rows = results.len(), "query executed");
        Ok(results)
    }

    /// Run a query that must produce exactly one row.
    ///
    /// # Errors
    ///
    /// `EmptyResult` on zero rows, `ResultSizeExceeded` on more than one, plus
    /// everything [`SqlTemplate::query`] can return.
    pub fn query_for_object<T, M>(
        &self,
        sql: &str,
        mapper: M,
        args: &[RowValues],
    ) -> Result<T, SqlTemplateError>
    where
        M: RowMapper<T>,
    {
        self.query_for_optional(sql, mapper, args)?.ok_or_else(|| {
            tracing::debug!(sql, "query_for_object result is empty");
            SqlTemplateError::EmptyResult
        })
    }

    /// Like [`SqlTemplate::query_for_object`], but zero rows is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// `ResultSizeExceeded` on more than one row, plus everything
    /// [`SqlTemplate::query`] can return.
    pub fn query_for_optional<T, M>(
        &self,
        sql: &str,
        mapper: M,
        args: &[RowValues],
    ) -> Result<Option<T>, SqlTemplateError>
    where
        M: RowMapper<T>,
    {
        let mut results = self.query(sql, mapper, args)?;
        if results.len() > 1 {
            tracing::warn!(sql, size = results.len(), "single-row query returned more than one row");
            return Err(SqlTemplateError::ResultSizeExceeded {
                size: results.len(),
            });
        }
        Ok(results.pop())
    }

    fn acquire(&self) -> Result<P::Connection<'_>, SqlTemplateError> {
        self.data_source.acquire().map_err(|e| {
            tracing::error!(error = %e, "connection acquisition failed");
            SqlTemplateError::ConnectionError("could not acquire a database connection".into())
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Update,
    Query,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Update => "update",
            Operation::Query => "query",
        }
    }
}

fn data_access(op: Operation, phase: Phase, sql: &str, err: &DriverError) -> SqlTemplateError {
    tracing::error!(sql, %phase, error = %err, "{} data access failed", op.name());
    let message = match phase {
        Phase::Prepare => format!("{} failed preparing statement", op.name()),
        Phase::Bind => format!("{} failed binding parameters", op.name()),
        Phase::Execute => format!("{} failed executing statement", op.name()),
        Phase::Read => format!("{} failed reading result rows", op.name()),
        Phase::Map => format!("{} failed mapping result rows", op.name()),
    };
    SqlTemplateError::DataAccess { phase, message }
}

fn bind_failure(op: Operation, sql: &str, err: BindError) -> SqlTemplateError {
    match err {
        BindError::Unsupported {
            position,
            type_name,
        } => {
            tracing::error!(sql, position, type_name, "unsupported parameter type");
            SqlTemplateError::UnsupportedParameterType {
                position,
                type_name,
            }
        }
        BindError::Driver { position, source } => {
            tracing::error!(sql, position, error = %source, "{} parameter binding failed", op.name());
            SqlTemplateError::DataAccess {
                phase: Phase::Bind,
                message: format!("{} failed binding parameter {position}", op.name()),
            }
        }
        BindError::CountMismatch { expected, actual } => {
            tracing::error!(sql, expected, actual, "{} parameter count mismatch", op.name());
            SqlTemplateError::DataAccess {
                phase: Phase::Bind,
                message: format!(
                    "{} expects {expected} parameters, got {actual}",
                    op.name()
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MappingError;
    use crate::results::DbRow;
    use crate::test_utils::mock::{Event, MockDataSource};

    fn account(row: &DbRow, _row_num: usize) -> Result<String, MappingError> {
        row.get_text("account")
    }

    #[test]
    fn query_releases_cursor_then_statement_then_connection() {
        let ds = MockDataSource::new().with_rows(
            &["id", "account"],
            vec![vec![1_i64.into(), "alice".into()]],
        );
        let template = SqlTemplate::new(ds.clone());
        let out = template.query("select id, account from t", account, &[]).unwrap();
        assert_eq!(out, vec!["alice".to_string()]);
        assert_eq!(
            ds.lifecycle(),
            vec![
                Event::Acquire,
                Event::CloseRows,
                Event::CloseStatement,
                Event::CloseConnection
            ]
        );
    }

    #[test]
    fn read_failure_is_distinguishable_from_execute_failure() {
        let reading = SqlTemplate::new(
            MockDataSource::new()
                .with_rows(&["account"], vec![vec!["a".into()], vec!["b".into()]])
                .failing_read_at(1),
        );
        let err = reading.query("select account from t", account, &[]).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Read));

        let executing = SqlTemplate::new(MockDataSource::new().failing_execute());
        let err = executing.query("select account from t", account, &[]).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Execute));
    }

    #[test]
    fn optional_is_none_on_zero_rows() {
        let template = SqlTemplate::new(MockDataSource::new().with_rows(&["account"], vec![]));
        let out = template
            .query_for_optional("select account from t where id = ?", account, &[1_i64.into()])
            .unwrap();
        assert_eq!(out, None);
    }
}
