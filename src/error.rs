use std::fmt;

use thiserror::Error;

/// Step of a template call at which a data-access failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Bind,
    Execute,
    Read,
    Map,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Prepare => "prepare",
            Phase::Bind => "bind",
            Phase::Execute => "execute",
            Phase::Read => "read",
            Phase::Map => "map",
        };
        f.write_str(name)
    }
}

/// Errors handed to callers of [`crate::SqlTemplate`].
///
/// Driver errors never appear here; they are logged where they are caught and
/// replaced by one of these kinds.
#[derive(Debug, Error)]
pub enum SqlTemplateError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Data access error ({phase}): {message}")]
    DataAccess { phase: Phase, message: String },

    #[error("Empty result: query_for_object found no rows")]
    EmptyResult,

    #[error("Result size exceeded: expected 1 row, got {size}")]
    ResultSizeExceeded { size: usize },

    #[error("Unsupported parameter type `{type_name}` at position {position}")]
    UnsupportedParameterType {
        position: usize,
        type_name: &'static str,
    },
}

impl SqlTemplateError {
    /// Phase of a `DataAccess` error, `None` for every other kind.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SqlTemplateError::DataAccess { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, SqlTemplateError::EmptyResult)
    }
}

/// Low-level failure reported by a driver implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("driver has no setter for {0} values")]
    UnsupportedType(&'static str),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Other driver error: {0}")]
    Other(String),
}

/// Failure while binding the argument list onto a statement.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("statement expects {expected} parameters, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("no binding for `{type_name}` at position {position}")]
    Unsupported {
        position: usize,
        type_name: &'static str,
    },

    #[error("binding position {position} failed: {source}")]
    Driver {
        position: usize,
        #[source]
        source: DriverError,
    },
}

/// Failure raised by a row mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MappingError(pub String);

impl MappingError {
    pub fn new(message: impl Into<String>) -> Self {
        MappingError(message.into())
    }

    #[must_use]
    pub fn missing_column(column: &str) -> Self {
        MappingError(format!("column `{column}` not found in row"))
    }

    #[must_use]
    pub fn wrong_kind(column: &str, expected: &str, found: &str) -> Self {
        MappingError(format!(
            "column `{column}`: expected {expected}, found {found}"
        ))
    }
}
