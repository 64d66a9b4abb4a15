use crate::error::MappingError;
use crate::results::DbRow;

/// Converts one result row into a caller type.
///
/// Any `Fn(&DbRow, usize) -> Result<T, MappingError>` is a mapper, so most
/// call sites pass a closure:
///
/// ```rust
/// use sql_template::{DbRow, MappingError, RowMapper};
///
/// let mapper = |row: &DbRow, _row_num: usize| -> Result<(i64, String), MappingError> {
///     Ok((row.get_i64("id")?, row.get_text("account")?))
/// };
/// # fn takes<M: RowMapper<(i64, String)>>(_m: M) {}
/// # takes(mapper);
/// ```
pub trait RowMapper<T> {
    /// Map the row at `row_num` (0-based, cursor order).
    ///
    /// # Errors
    ///
    /// Returns `MappingError` if the row cannot be turned into a `T`.
    fn map_row(&self, row: &DbRow, row_num: usize) -> Result<T, MappingError>;
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(&DbRow, usize) -> Result<T, MappingError>,
{
    fn map_row(&self, row: &DbRow, row_num: usize) -> Result<T, MappingError> {
        self(row, row_num)
    }
}
