use rusqlite::types::Value;

use crate::error::DriverError;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `DriverError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<RowValues, DriverError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Extract the first `col_count` columns of a `SQLite` row.
///
/// # Errors
///
/// Returns `DriverError` if any value cannot be read.
pub fn sqlite_extract_row(
    row: &rusqlite::Row<'_>,
    col_count: usize,
) -> Result<Vec<RowValues>, DriverError> {
    (0..col_count)
        .map(|idx| sqlite_extract_value(row, idx))
        .collect()
}
