//! Compiles condition maps into `WHERE` clauses.
//!
//! Keys are column names with an optional operator suffix:
//!
//! | key          | rendered as                          |
//! |--------------|--------------------------------------|
//! | `col`        | `=`, `IN (..)` or `IS NULL`          |
//! | `col[!]`     | `!=`, `NOT IN (..)` or `IS NOT NULL` |
//! | `col[>]` ..  | `>`, `>=`, `<`, `<=`                 |
//! | `col[~]`     | `LIKE`                               |
//! | `col[!~]`    | `NOT LIKE`                           |
//! | `col[<>]`    | `BETWEEN`                            |
//! | `col[><]`    | `NOT BETWEEN`                        |
//!
//! `AND` and `OR` keys (optionally suffixed with ` #comment` to keep them
//! unique) take a nested condition map.

use crate::{
    error::{DbError, Result},
    expr::{
        ops::{BetweenOp, BinaryOp, InOp, LikeOp, LogicalOp, NullOp},
        Col,
    },
    query::conditions::{ConditionValue, Conditions},
    traits::Expression,
    value::Value,
};

/// Builds the expression tree for a condition map. Top-level entries are
/// joined with `AND`. Returns `None` when there is nothing to filter on.
pub fn compile(conditions: &Conditions) -> Result<Option<LogicalOp>> {
    let op = group(conditions, "AND")?;
    Ok((!op.is_empty()).then_some(op))
}

/// Renders the ` WHERE ..` suffix of a statement, or an empty string.
pub fn where_clause(conditions: &Conditions, params: &mut Vec<Value>) -> Result<String> {
    Ok(match compile(conditions)? {
        Some(expr) => format!(" WHERE {}", expr.to_sql(params)),
        None => String::new(),
    })
}

/// Groups that end up empty are dropped so they never render as a dangling
/// `AND` / `OR` operand.
fn group(conditions: &Conditions, op: &'static str) -> Result<LogicalOp> {
    let mut parts: Vec<Box<dyn Expression>> = Vec::with_capacity(conditions.len());
    for (key, value) in conditions.iter() {
        let Some(logical) = logical_key(key) else {
            parts.push(predicate(key, value)?);
            continue;
        };
        let ConditionValue::Group(inner) = value else {
            return Err(DbError::invalid_condition(
                key,
                "logical groups take a nested condition map",
            ));
        };
        let nested = group(inner, logical)?;
        if !nested.is_empty() {
            parts.push(Box::new(nested));
        }
    }
    Ok(LogicalOp::new(parts, op))
}

fn logical_key(key: &str) -> Option<&'static str> {
    let head = key.split(" #").next().unwrap_or(key).trim();
    match head {
        "AND" => Some("AND"),
        "OR" => Some("OR"),
        _ => None,
    }
}

fn split_key(key: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = key.strip_suffix(']') {
        if let Some(pos) = stripped.rfind('[') {
            return (stripped[..pos].trim(), Some(&stripped[pos + 1..]));
        }
    }
    (key.trim(), None)
}

fn predicate(key: &str, value: &ConditionValue) -> Result<Box<dyn Expression>> {
    let (column, op) = split_key(key);
    if column.is_empty() {
        return Err(DbError::invalid_condition(key, "missing column name"));
    }
    let col = Col::new(column);

    match (op, value) {
        (_, ConditionValue::Group(_)) => Err(DbError::invalid_condition(
            key,
            "nested maps are only allowed under AND / OR",
        )),
        (None, ConditionValue::Value(Value::Null)) => Ok(Box::new(NullOp::new(col, true))),
        (Some("!"), ConditionValue::Value(Value::Null)) => Ok(Box::new(NullOp::new(col, false))),
        (None, ConditionValue::Value(v)) => Ok(Box::new(BinaryOp::new(col, "=", v.clone()))),
        (Some("!"), ConditionValue::Value(v)) => {
            Ok(Box::new(BinaryOp::new(col, "!=", v.clone())))
        }
        (None, ConditionValue::List(values)) => {
            Ok(Box::new(InOp::new(col, values.clone(), false)))
        }
        (Some("!"), ConditionValue::List(values)) => {
            Ok(Box::new(InOp::new(col, values.clone(), true)))
        }
        (Some(cmp @ (">" | ">=" | "<" | "<=")), ConditionValue::Value(v)) => {
            let cmp = match cmp {
                ">" => ">",
                ">=" => ">=",
                "<" => "<",
                _ => "<=",
            };
            Ok(Box::new(BinaryOp::new(col, cmp, v.clone())))
        }
        (Some(">" | ">=" | "<" | "<="), ConditionValue::List(_)) => Err(
            DbError::invalid_condition(key, "comparison operators take a single value"),
        ),
        (Some(like @ ("~" | "!~")), value) => {
            let negated = like == "!~";
            let patterns = match value {
                ConditionValue::Value(v) => vec![v.clone()],
                ConditionValue::List(values) => values.clone(),
                ConditionValue::Group(_) => {
                    return Err(DbError::invalid_condition(
                        key,
                        "LIKE takes a pattern or a list of patterns",
                    ))
                }
            };
            let parts = patterns
                .into_iter()
                .map(|pattern| {
                    let pattern = pattern.to_text().ok_or_else(|| {
                        DbError::invalid_condition(key, "LIKE patterns must be text or numbers")
                    })?;
                    Ok(Box::new(LikeOp::new(col.clone(), pattern, negated)) as Box<dyn Expression>)
                })
                .collect::<Result<Vec<_>>>()?;
            if parts.is_empty() {
                return Err(DbError::invalid_condition(key, "no pattern given"));
            }
            Ok(Box::new(LogicalOp::new(
                parts,
                if negated { "AND" } else { "OR" },
            )))
        }
        (Some(range @ ("<>" | "><")), ConditionValue::List(values)) => match values.as_slice() {
            [low, high] => Ok(Box::new(BetweenOp::new(
                col,
                low.clone(),
                high.clone(),
                range == "><",
            ))),
            _ => Err(DbError::invalid_condition(
                key,
                "BETWEEN takes exactly two values",
            )),
        },
        (Some("<>" | "><"), ConditionValue::Value(_)) => Err(DbError::invalid_condition(
            key,
            "BETWEEN takes exactly two values",
        )),
        (Some(other), _) => Err(DbError::invalid_condition(
            key,
            format!("unknown operator `[{other}]`"),
        )),
    }
}
