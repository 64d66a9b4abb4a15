//! Convenient imports for common functionality.

pub use crate::driver::ConnectionProvider;
pub use crate::error::{MappingError, Phase, SqlTemplateError};
pub use crate::mapper::RowMapper;
pub use crate::results::DbRow;
pub use crate::template::SqlTemplate;
pub use crate::types::RowValues;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SingleConnectionDataSource, SqliteDataSource, SqliteOptions};
