//! Projection normalization.
//!
//! A projection says which columns to fetch and how each of them is
//! post-processed. It is normalized once per query into a
//! [`PreparedQuery`]: the column list handed to the primitive plus a
//! column → [`Directive`] map applied to every returned row.

use crate::{
    transform::{Directive, Pipeline},
    value::{Row, Value},
};

/// A single entry of a column projection.
#[derive(Debug)]
pub enum ProjectionEntry {
    /// A bare column, fetched as is.
    Column(String),
    /// A column whose values go through a directive.
    Transformed { column: String, directive: Directive },
}

/// The columns requested by `select`/`get`.
#[derive(Debug, Default)]
pub enum Projection {
    /// All columns, untransformed.
    #[default]
    All,
    Columns(Vec<ProjectionEntry>),
}

impl Projection {
    /// Starts an empty column list to be extended with [`Projection::column`],
    /// [`Projection::pipe`] and [`Projection::map`].
    pub fn columns() -> Self {
        Projection::Columns(Vec::new())
    }

    /// A single column, optionally transformed by a pipe-delimited directive.
    pub fn single(column: impl Into<String>, operation: Option<&str>) -> Self {
        let column = column.into();
        match operation {
            Some(operation) => Projection::Columns(vec![ProjectionEntry::Transformed {
                column,
                directive: Directive::from(operation),
            }]),
            None => Projection::Columns(vec![ProjectionEntry::Column(column)]),
        }
    }

    pub fn column(self, column: impl Into<String>) -> Self {
        self.push(ProjectionEntry::Column(column.into()))
    }

    /// Adds a column post-processed by a pipe-delimited list of operations.
    pub fn pipe(self, column: impl Into<String>, operations: &str) -> Self {
        self.push(ProjectionEntry::Transformed {
            column: column.into(),
            directive: Directive::Pipeline(Pipeline::parse(operations)),
        })
    }

    /// Adds a column post-processed by a callable.
    pub fn map<F: Fn(Value) -> Value + 'static>(self, column: impl Into<String>, f: F) -> Self {
        self.push(ProjectionEntry::Transformed {
            column: column.into(),
            directive: Directive::callable(f),
        })
    }

    fn push(self, entry: ProjectionEntry) -> Self {
        match self {
            Projection::All => Projection::Columns(vec![entry]),
            Projection::Columns(mut entries) => {
                entries.push(entry);
                Projection::Columns(entries)
            }
        }
    }

    /// Splits the projection into the fetched column list and the transform
    /// map.
    pub fn prepare(self) -> PreparedQuery {
        let entries = match self {
            Projection::All => return PreparedQuery::default(),
            Projection::Columns(entries) => entries,
        };

        let mut columns = Vec::with_capacity(entries.len());
        let mut transforms = Vec::new();
        for entry in entries {
            match entry {
                ProjectionEntry::Column(column) => columns.push(column),
                ProjectionEntry::Transformed { column, directive } => {
                    columns.push(column.clone());
                    transforms.push((column, directive));
                }
            }
        }

        PreparedQuery {
            columns: Some(columns),
            transforms,
        }
    }
}

impl From<&str> for Projection {
    fn from(column: &str) -> Self {
        if column == "*" {
            Projection::All
        } else {
            Projection::single(column, None)
        }
    }
}

impl From<String> for Projection {
    fn from(column: String) -> Self {
        Projection::from(column.as_str())
    }
}

impl<const N: usize> From<[&str; N]> for Projection {
    fn from(columns: [&str; N]) -> Self {
        columns.into_iter().collect()
    }
}

impl From<Vec<&str>> for Projection {
    fn from(columns: Vec<&str>) -> Self {
        columns.into_iter().collect()
    }
}

impl<'a> FromIterator<&'a str> for Projection {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Projection::Columns(
            iter.into_iter()
                .map(|column| ProjectionEntry::Column(column.to_string()))
                .collect(),
        )
    }
}

/// A normalized projection.
///
/// `columns` is `None` for the wildcard, which also disables every
/// transform.
#[derive(Debug, Default)]
pub struct PreparedQuery {
    pub columns: Option<Vec<String>>,
    pub transforms: Vec<(String, Directive)>,
}

impl PreparedQuery {
    pub fn is_wildcard(&self) -> bool {
        self.columns.is_none()
    }

    /// Applies the configured directives to the columns present in `row`.
    /// A column listed more than once uses its last directive.
    pub fn apply(&self, row: &mut Row) {
        if self.is_wildcard() || self.transforms.is_empty() {
            return;
        }

        for (column, value) in row.iter_mut() {
            if let Some((_, directive)) = self.transforms.iter().rfind(|(name, _)| name == column) {
                *value = directive.apply(std::mem::take(value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_has_no_columns_or_transforms() {
        let prepared = Projection::from("*").prepare();
        assert!(prepared.is_wildcard());
        assert!(prepared.transforms.is_empty());
    }

    #[test]
    fn test_single_column_with_operation() {
        let prepared = Projection::single("email", Some("trim|email")).prepare();
        assert_eq!(prepared.columns, Some(vec!["email".to_string()]));
        assert_eq!(prepared.transforms.len(), 1);
        assert_eq!(prepared.transforms[0].0, "email");
    }

    #[test]
    fn test_single_column_without_operation() {
        let prepared = Projection::from("email").prepare();
        assert_eq!(prepared.columns, Some(vec!["email".to_string()]));
        assert!(prepared.transforms.is_empty());
    }

    #[test]
    fn test_mixed_projection() {
        let prepared = Projection::columns()
            .column("id")
            .pipe("name", "trim")
            .map("score", |v| Value::Integer(v.as_i64().unwrap_or_default() * 2))
            .prepare();

        assert_eq!(
            prepared.columns,
            Some(vec!["id".to_string(), "name".to_string(), "score".to_string()])
        );
        let keys: Vec<_> = prepared.transforms.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "score"]);
    }

    #[test]
    fn test_apply_skips_missing_columns() {
        let prepared = Projection::columns()
            .pipe("name", "trim")
            .pipe("missing", "truncate:1")
            .prepare();

        let mut row = Row::new().with("name", "  ada  ").with("id", 7);
        prepared.apply(&mut row);
        assert_eq!(row, Row::new().with("name", "ada").with("id", 7));
    }

    #[test]
    fn test_last_directive_wins_for_repeated_column() {
        let prepared = Projection::columns()
            .pipe("name", "truncate:1")
            .pipe("name", "trim")
            .prepare();

        let mut row = Row::new().with("name", "  ada  ");
        prepared.apply(&mut row);
        assert_eq!(row.get("name"), Some(&Value::from("ada")));
    }
}
