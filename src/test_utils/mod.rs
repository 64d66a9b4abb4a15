//! Test doubles for code built on [`crate::SqlTemplate`].

pub mod mock;

pub use mock::{Event, MockConnection, MockDataSource, MockRows, MockStatement};
