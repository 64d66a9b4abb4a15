use crate::driver::PreparedStatement;
use crate::error::{BindError, DriverError};
use crate::types::RowValues;

/// Bind `args` onto `stmt`, `args[i]` at placeholder `i + 1`.
///
/// When the driver reports a placeholder count that differs from
/// `args.len()`, nothing is bound.
///
/// # Errors
///
/// Returns `BindError` on a count mismatch, a kind the driver has no setter
/// for, or a driver failure at a given position.
pub fn bind_params<S>(stmt: &mut S, args: &[RowValues]) -> Result<(), BindError>
where
    S: PreparedStatement + ?Sized,
{
    if let Some(expected) = stmt.parameter_count() {
        if expected != args.len() {
            return Err(BindError::CountMismatch {
                expected,
                actual: args.len(),
            });
        }
    }

    for (idx, arg) in args.iter().enumerate() {
        let position = idx + 1;
        bind_one(stmt, position, arg).map_err(|source| match source {
            DriverError::UnsupportedType(_) => BindError::Unsupported {
                position,
                type_name: arg.type_name(),
            },
            source => BindError::Driver { position, source },
        })?;
    }
    Ok(())
}

fn bind_one<S>(stmt: &mut S, position: usize, arg: &RowValues) -> Result<(), DriverError>
where
    S: PreparedStatement + ?Sized,
{
    match arg {
        RowValues::Int(i) => stmt.bind_int(position, *i),
        RowValues::Float(f) => stmt.bind_float(position, *f),
        RowValues::Text(s) => stmt.bind_text(position, s),
        RowValues::Bool(b) => stmt.bind_bool(position, *b),
        RowValues::Timestamp(dt) => stmt.bind_timestamp(position, dt),
        RowValues::Null => stmt.bind_null(position),
        RowValues::JSON(json) => stmt.bind_json(position, json),
        RowValues::Blob(bytes) => stmt.bind_blob(position, bytes),
    }
}
