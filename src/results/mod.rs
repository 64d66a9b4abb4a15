pub mod row;

pub use row::DbRow;
