// SQLite backend for the template.
//
// - config: options, builder and the two data sources
// - connection: connection, statement and cursor handles
// - params: storage encoding for timestamp and JSON arguments
// - query: row value extraction

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{SingleConnectionDataSource, SqliteDataSource, SqliteOptions, SqliteOptionsBuilder};
pub use connection::{SqliteConnection, SqliteRows, SqliteStatement};
