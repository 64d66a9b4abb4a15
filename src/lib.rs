//! Synchronous statement executor for relational databases.
//!
//! [`SqlTemplate`] takes SQL with positional placeholders, an argument list
//! and a [`RowMapper`], and handles the rest: it acquires a connection from a
//! [`ConnectionProvider`], binds the arguments, runs the statement, maps rows
//! and releases every handle it opened on every exit path. Failures reach the
//! caller as one [`SqlTemplateError`].
//!
//! ```rust,no_run
//! # #[cfg(feature = "sqlite")]
//! # fn demo() -> Result<(), sql_template::SqlTemplateError> {
//! use sql_template::prelude::*;
//!
//! let template = SqlTemplate::new(SqliteOptions::builder("app.db".into()).build());
//! template.execute(
//!     "insert into users (account, password, email) values (?, ?, ?)",
//!     &["alice".into(), "pw1".into(), "a@x.com".into()],
//! )?;
//! let email: String = template.query_for_object(
//!     "select email from users where account = ?",
//!     |row: &DbRow, _: usize| row.get_text("email"),
//!     &["alice".into()],
//! )?;
//! # let _ = email;
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod driver;
pub mod error;
pub mod mapper;
pub mod prelude;
pub mod results;
pub mod template;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use binder::bind_params;
pub use driver::{Connection, ConnectionProvider, PreparedStatement, RowCursor};
pub use error::{BindError, DriverError, MappingError, Phase, SqlTemplateError};
pub use mapper::RowMapper;
pub use results::DbRow;
pub use template::SqlTemplate;
pub use types::RowValues;
