pub mod connection;
pub mod error;
pub mod expr;
pub mod query;
pub mod repository;
pub mod traits;
pub mod transform;
pub mod value;

#[cfg(test)]
pub mod test_utils;

pub use connection::SqliteDatabase;
pub use error::{DbError, Result};
pub use query::*;
pub use repository::ActivityLog;
pub use traits::{Expression, Primitive};
pub use transform::{apply_operations, sanitize, Directive, Operation, Pipeline};
pub use value::{Fetched, Row, Value};
