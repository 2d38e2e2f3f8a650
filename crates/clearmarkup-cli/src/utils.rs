use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use clearmarkup_db::{ConditionValue, Direction, Value};
use nu_ansi_term::Color;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().map(|c| *c).unwrap_or(true);
        if color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

fn split_pair<'a>(raw: &'a str, expected: &str) -> Result<(&'a str, &'a str), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `{expected}`, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key, value))
}

fn scalar(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => b.into(),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => s.into(),
        other => other.to_string().into(),
    }
}

/// Interprets a command line value as JSON, falling back to plain text.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw)
        .map(scalar)
        .unwrap_or_else(|_| Value::Text(raw.to_string()))
}

/// Parses `key=value`. A JSON array value becomes an `IN` list.
pub fn parse_condition(raw: &str) -> Result<(String, ConditionValue), String> {
    let (key, value) = split_pair(raw, "key=value")?;
    let value = match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Array(items)) => {
            ConditionValue::List(items.into_iter().map(scalar).collect())
        }
        Ok(json) => ConditionValue::Value(scalar(json)),
        Err(_) => ConditionValue::Value(Value::Text(value.to_string())),
    };
    Ok((key.to_string(), value))
}

pub fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = split_pair(raw, "column=value")?;
    Ok((key.to_string(), parse_value(value)))
}

pub fn parse_transform(raw: &str) -> Result<(String, String), String> {
    let (column, operations) = split_pair(raw, "column=operations")?;
    Ok((column.to_string(), operations.trim().to_string()))
}

/// Parses `column` or `column:asc` / `column:desc`.
pub fn parse_order(raw: &str) -> Result<(String, Direction), String> {
    let (column, direction) = match raw.rsplit_once(':') {
        Some((column, direction)) => (column, direction),
        None => (raw, "asc"),
    };
    let direction = match direction.to_ascii_lowercase().as_str() {
        "asc" => Direction::Asc,
        "desc" => Direction::Desc,
        other => return Err(format!("unknown sort direction `{other}`")),
    };
    Ok((column.trim().to_string(), direction))
}

/// Parses `table:column`.
pub fn parse_relation(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => {
            Ok((table.to_string(), column.to_string()))
        }
        _ => Err(format!("expected `table:column`, got `{raw}`")),
    }
}
