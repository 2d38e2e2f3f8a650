//! SQL expression operators.
//!
//! These structs represent compound expressions like `col = ?`, `col LIKE ?`, etc.
//! Each implements [`Expression`] and recursively builds SQL fragments.

use crate::{traits::Expression, value::Value};

/// Represents a binary comparison (e.g., `=`, `>`, `<=`).
pub struct BinaryOp<L> {
    left: L,
    op: &'static str,
    right: Value,
}

impl<L> BinaryOp<L> {
    pub fn new(left: L, op: &'static str, right: Value) -> Self {
        Self { left, op, right }
    }
}

impl<L: Expression> Expression for BinaryOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        params.push(self.right.clone());
        format!("{} {} ?", left_sql, self.op)
    }
}

/// Represents a `LIKE` or `NOT LIKE` pattern match.
///
/// Patterns without `%` or `_` are matched anywhere in the value.
pub struct LikeOp<L> {
    left: L,
    pattern: String,
    negated: bool,
}

impl<L> LikeOp<L> {
    pub fn new(left: L, pattern: String, negated: bool) -> Self {
        Self {
            left,
            pattern,
            negated,
        }
    }
}

impl<L: Expression> Expression for LikeOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        let pattern = if self.pattern.contains(['%', '_']) {
            self.pattern.clone()
        } else {
            format!("%{}%", self.pattern)
        };
        params.push(pattern.into());
        let op = if self.negated { "NOT LIKE" } else { "LIKE" };
        format!("{} {} ?", left_sql, op)
    }
}

/// Represents an `IN` or `NOT IN` clause.
///
/// An empty set never matches (`IN`) or always matches (`NOT IN`).
pub struct InOp<L> {
    left: L,
    values: Vec<Value>,
    negated: bool,
}

impl<L> InOp<L> {
    pub fn new(left: L, values: Vec<Value>, negated: bool) -> Self {
        Self {
            left,
            values,
            negated,
        }
    }
}

impl<L: Expression> Expression for InOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        if self.values.is_empty() {
            return if self.negated { "1 = 1" } else { "1 = 0" }.to_string();
        }
        let left_sql = self.left.to_sql(params);
        let placeholders = vec!["?"; self.values.len()].join(", ");
        params.extend(self.values.iter().cloned());
        let op = if self.negated { "NOT IN" } else { "IN" };
        format!("{} {} ({})", left_sql, op, placeholders)
    }
}

/// Represents an `IS NULL` or `IS NOT NULL` check.
pub struct NullOp<L> {
    left: L,
    is_null: bool,
}

impl<L> NullOp<L> {
    pub fn new(left: L, is_null: bool) -> Self {
        Self { left, is_null }
    }
}

impl<L: Expression> Expression for NullOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        let op = if self.is_null {
            "IS NULL"
        } else {
            "IS NOT NULL"
        };
        format!("{} {}", left_sql, op)
    }
}

/// Represents a `BETWEEN` or `NOT BETWEEN` range check.
pub struct BetweenOp<L> {
    left: L,
    low: Value,
    high: Value,
    negated: bool,
}

impl<L> BetweenOp<L> {
    pub fn new(left: L, low: Value, high: Value, negated: bool) -> Self {
        Self {
            left,
            low,
            high,
            negated,
        }
    }
}

impl<L: Expression> Expression for BetweenOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        params.push(self.low.clone());
        params.push(self.high.clone());
        let op = if self.negated {
            "NOT BETWEEN"
        } else {
            "BETWEEN"
        };
        format!("{} {} ? AND ?", left_sql, op)
    }
}

/// Joins any number of expressions with `AND` or `OR`.
pub struct LogicalOp {
    parts: Vec<Box<dyn Expression>>,
    op: &'static str,
}

impl LogicalOp {
    pub fn new(parts: Vec<Box<dyn Expression>>, op: &'static str) -> Self {
        Self { parts, op }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Expression for LogicalOp {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let parts = self
            .parts
            .iter()
            .map(|part| part.to_sql(params))
            .collect::<Vec<_>>();
        match parts.len() {
            0 => String::new(),
            1 => parts.join(""),
            _ => format!("({})", parts.join(&format!(" {} ", self.op))),
        }
    }
}
