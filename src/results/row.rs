use std::sync::Arc;

use crate::error::MappingError;
use crate::types::RowValues;

/// One row read from a cursor, handed to a [`crate::RowMapper`].
///
/// Column names are shared by every row of the same result.
#[derive(Debug, Clone)]
pub struct DbRow {
    /// The column names for this row (shared across all rows in a result)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, in column order
    pub values: Vec<RowValues>,
}

impl DbRow {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        Self {
            column_names,
            values,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    fn require(&self, column_name: &str) -> Result<&RowValues, MappingError> {
        self.get(column_name)
            .ok_or_else(|| MappingError::missing_column(column_name))
    }

    /// Read an integer column.
    ///
    /// # Errors
    ///
    /// Returns `MappingError` if the column is missing or not an integer.
    pub fn get_i64(&self, column_name: &str) -> Result<i64, MappingError> {
        let value = self.require(column_name)?;
        value
            .as_int()
            .copied()
            .ok_or_else(|| MappingError::wrong_kind(column_name, "int", value.type_name()))
    }

    /// Read a floating point column; integers are widened.
    ///
    /// # Errors
    ///
    /// Returns `MappingError` if the column is missing or not numeric.
    pub fn get_f64(&self, column_name: &str) -> Result<f64, MappingError> {
        let value = self.require(column_name)?;
        value
            .as_float()
            .ok_or_else(|| MappingError::wrong_kind(column_name, "float", value.type_name()))
    }

    /// Read a text column.
    ///
    /// # Errors
    ///
    /// Returns `MappingError` if the column is missing or not text.
    pub fn get_text(&self, column_name: &str) -> Result<String, MappingError> {
        let value = self.require(column_name)?;
        value
            .as_text()
            .map(ToString::to_string)
            .ok_or_else(|| MappingError::wrong_kind(column_name, "text", value.type_name()))
    }

    /// Read a nullable text column.
    ///
    /// # Errors
    ///
    /// Returns `MappingError` if the column is missing or neither text nor NULL.
    pub fn get_optional_text(&self, column_name: &str) -> Result<Option<String>, MappingError> {
        let value = self.require(column_name)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_text()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| MappingError::wrong_kind(column_name, "text", value.type_name()))
    }

    /// Read a boolean column (0/1 integers accepted).
    ///
    /// # Errors
    ///
    /// Returns `MappingError` if the column is missing or not boolean-like.
    pub fn get_bool(&self, column_name: &str) -> Result<bool, MappingError> {
        let value = self.require(column_name)?;
        value
            .as_bool()
            .copied()
            .ok_or_else(|| MappingError::wrong_kind(column_name, "bool", value.type_name()))
    }
}
