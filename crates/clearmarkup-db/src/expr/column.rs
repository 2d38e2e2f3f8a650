//! Column references.

use crate::{traits::Expression, value::Value};

/// Quotes an identifier, keeping `table.column` qualification and the `*`
/// wildcard intact.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| {
            if part == "*" {
                part.to_string()
            } else {
                format!("\"{}\"", part.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// A reference to a database column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Col {
    pub name: String,
}

impl Col {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Expression for Col {
    fn to_sql(&self, _params: &mut Vec<Value>) -> String {
        quote_identifier(&self.name)
    }
}
