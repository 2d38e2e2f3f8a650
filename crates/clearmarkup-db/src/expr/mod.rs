//! SQL rendering of condition maps for the SQLite primitive.

pub mod column;
pub mod condition;
pub mod ops;

pub use column::{quote_identifier, Col};
pub use condition::{compile, where_clause};
