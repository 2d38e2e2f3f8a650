//! Ordering and limiting clauses.
//!
//! Both are opaque to the builder: they are stored as given and handed to the
//! primitive untouched.

use std::fmt::{self, Display};

/// Sort direction of an ORDER BY clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "ASC"),
            Direction::Desc => write!(f, "DESC"),
        }
    }
}

/// One column of an ORDER BY clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub direction: Direction,
}

/// An ordered list of sort columns.
///
/// Built from a bare column (ascending), a `(column, direction)` pair, or a
/// list of pairs for multi-column ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec(Vec<OrderClause>);

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.0.push(OrderClause {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn clauses(&self) -> &[OrderClause] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for OrderSpec {
    fn from(column: &str) -> Self {
        OrderSpec::new().then(column, Direction::Asc)
    }
}

impl From<String> for OrderSpec {
    fn from(column: String) -> Self {
        OrderSpec::new().then(column, Direction::Asc)
    }
}

impl<S: Into<String>> From<(S, Direction)> for OrderSpec {
    fn from((column, direction): (S, Direction)) -> Self {
        OrderSpec::new().then(column, direction)
    }
}

impl<S: Into<String>> From<Vec<(S, Direction)>> for OrderSpec {
    fn from(columns: Vec<(S, Direction)>) -> Self {
        columns
            .into_iter()
            .fold(OrderSpec::new(), |spec, (column, direction)| {
                spec.then(column, direction)
            })
    }
}

/// Row limit, either a plain count or an `(offset, count)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSpec {
    Count(u64),
    Range { offset: u64, count: u64 },
}

impl LimitSpec {
    pub fn count(&self) -> u64 {
        match self {
            LimitSpec::Count(count) | LimitSpec::Range { count, .. } => *count,
        }
    }

    pub fn offset(&self) -> Option<u64> {
        match self {
            LimitSpec::Count(_) => None,
            LimitSpec::Range { offset, .. } => Some(*offset),
        }
    }
}

impl From<u64> for LimitSpec {
    fn from(count: u64) -> Self {
        LimitSpec::Count(count)
    }
}

impl From<(u64, u64)> for LimitSpec {
    fn from((offset, count): (u64, u64)) -> Self {
        LimitSpec::Range { offset, count }
    }
}
