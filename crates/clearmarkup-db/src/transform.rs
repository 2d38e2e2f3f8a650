//! Scalar value transformations applied to fetched columns.
//!
//! A pipeline is written as a pipe-delimited list of operation names, each
//! with an optional `:parameter`, and applied left to right:
//!
//! ```
//! use clearmarkup_db::{transform::apply_operations, Value};
//!
//! let value = apply_operations(Value::from("  hello world  "), "trim|truncate:5");
//! assert_eq!(value, Value::from("hello..."));
//! ```
//!
//! Unknown operation names are ignored.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use tracing::trace;

use crate::value::Value;

/// Length used by `truncate` when no valid length is given.
pub const DEFAULT_TRUNCATE_LENGTH: usize = 57;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?(?:-->|\z)|<[A-Za-z/!?][^>]*(?:>|\z)")
        .expect("unable to compile markup tag regex")
});

/// Characters stripped by `trim`.
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// A single named transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Trim,
    Escape,
    EmptyStringToNull,
    StripTags,
    Truncate(usize),
    Email,
}

impl Operation {
    /// Parses `name[:parameter]`, returning `None` for unknown names.
    pub fn parse(directive: &str) -> Option<Self> {
        let mut parts = directive.split(':');
        let name = parts.next().unwrap_or_default();
        let parameter = parts.next();

        let operation = match name {
            "trim" => Operation::Trim,
            "escape" => Operation::Escape,
            "empty_string_to_null" => Operation::EmptyStringToNull,
            "strip_tags" => Operation::StripTags,
            "truncate" => Operation::Truncate(
                parameter
                    .and_then(|p| p.trim().parse().ok())
                    .unwrap_or(DEFAULT_TRUNCATE_LENGTH),
            ),
            "email" => Operation::Email,
            _ => {
                trace!("ignoring unknown transform `{directive}`");
                return None;
            }
        };
        Some(operation)
    }

    pub fn apply(&self, value: Value) -> Value {
        match self {
            Operation::EmptyStringToNull => match value {
                Value::Text(text) if text.is_empty() => Value::Null,
                other => other,
            },
            Operation::Trim => map_text(value, |s| s.trim_matches(TRIM_CHARS).to_string()),
            Operation::Escape => map_text(value, |s| escape_html(&s)),
            Operation::StripTags => map_text(value, |s| TAG_RE.replace_all(&s, "").into_owned()),
            Operation::Truncate(length) => map_text(value, |s| truncate(s, *length)),
            Operation::Email => map_text(value, |s| sanitize_email(&s)),
        }
    }
}

fn map_text<F: FnOnce(String) -> String>(value: Value, f: F) -> Value {
    match value.to_text() {
        Some(text) => Value::Text(f(text)),
        None => value,
    }
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn truncate(s: String, length: usize) -> String {
    if s.chars().count() > length {
        let mut cut: String = s.chars().take(length).collect();
        cut.push_str("...");
        cut
    } else {
        s
    }
}

fn sanitize_email(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(*c))
        .collect()
}

/// An ordered sequence of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline(Vec<Operation>);

impl Pipeline {
    /// Parses a pipe-delimited directive such as `"trim|truncate:20"`.
    pub fn parse(directive: &str) -> Self {
        directive.split('|').collect()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.0
    }

    pub fn apply(&self, value: Value) -> Value {
        self.0.iter().fold(value, |value, operation| operation.apply(value))
    }
}

impl<'a> FromIterator<&'a str> for Pipeline {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Pipeline(iter.into_iter().filter_map(Operation::parse).collect())
    }
}

/// Applies a pipe-delimited list of operations to `value`.
pub fn apply_operations(value: Value, operations: &str) -> Value {
    Pipeline::parse(operations).apply(value)
}

/// User-supplied transformation of a single value.
pub type Transform = Box<dyn Fn(Value) -> Value>;

/// How a projected column is post-processed.
pub enum Directive {
    Pipeline(Pipeline),
    Callable(Transform),
}

impl Directive {
    pub fn callable<F: Fn(Value) -> Value + 'static>(f: F) -> Self {
        Directive::Callable(Box::new(f))
    }

    pub fn apply(&self, value: Value) -> Value {
        match self {
            Directive::Pipeline(pipeline) => pipeline.apply(value),
            Directive::Callable(f) => f(value),
        }
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Pipeline(pipeline) => f.debug_tuple("Pipeline").field(pipeline).finish(),
            Directive::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

impl From<&str> for Directive {
    fn from(directive: &str) -> Self {
        Directive::Pipeline(Pipeline::parse(directive))
    }
}

impl From<&[&str]> for Directive {
    fn from(operations: &[&str]) -> Self {
        Directive::Pipeline(operations.iter().copied().collect())
    }
}

impl From<Pipeline> for Directive {
    fn from(pipeline: Pipeline) -> Self {
        Directive::Pipeline(pipeline)
    }
}

/// Sanitizes a standalone value with either a pipeline or a callable.
pub fn sanitize(value: Value, directive: impl Into<Directive>) -> Value {
    directive.into().apply(value)
}
