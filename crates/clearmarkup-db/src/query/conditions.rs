//! WHERE-equivalent predicates and the per-query condition set.

use crate::{
    query::clause::{LimitSpec, OrderSpec},
    value::Value,
};

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// A scalar compared with the column.
    Value(Value),
    /// A set of values, e.g. for `IN` or `BETWEEN`.
    List(Vec<Value>),
    /// A nested `AND`/`OR` group.
    Group(Conditions),
}

impl ConditionValue {
    pub fn list<T: Into<Value>, I: IntoIterator<Item = T>>(values: I) -> Self {
        ConditionValue::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ConditionValue {
                fn from(value: $t) -> Self {
                    ConditionValue::Value(value.into())
                }
            }
        )*
    };
}

from_scalar!(Value, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String);

impl<T: Into<Value>> From<Option<T>> for ConditionValue {
    fn from(value: Option<T>) -> Self {
        ConditionValue::Value(value.into())
    }
}

impl From<Vec<Value>> for ConditionValue {
    fn from(values: Vec<Value>) -> Self {
        ConditionValue::List(values)
    }
}

impl From<Conditions> for ConditionValue {
    fn from(group: Conditions) -> Self {
        ConditionValue::Group(group)
    }
}

macro_rules! from_list {
    ($($t:ty),*) => {
        $(
            impl From<Vec<$t>> for ConditionValue {
                fn from(values: Vec<$t>) -> Self {
                    ConditionValue::list(values)
                }
            }
        )*
    };
}

from_list!(i32, i64, &str, String);

/// A mapping from column predicate (`"id"`, `"created_at[>]"`, `"AND"`) to
/// its value.
///
/// Keys are unique: inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions(Vec<(String, ConditionValue)>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConditionValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    /// Merges `other` into these conditions; keys present in both take the
    /// value from `other`.
    pub fn merge(mut self, other: Conditions) -> Self {
        for (key, value) in other.0 {
            self.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConditionValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConditionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ConditionValue>> From<(K, V)> for Conditions {
    fn from((key, value): (K, V)) -> Self {
        Conditions::new().with(key, value)
    }
}

impl<K: Into<String>, V: Into<ConditionValue>, const N: usize> From<[(K, V); N]> for Conditions {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<ConditionValue>> FromIterator<(K, V)> for Conditions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Conditions::new(), |conditions, (k, v)| conditions.with(k, v))
    }
}

/// A one-hop relation: restrict the primary table's `id` to the values of
/// `column` found in `table` under `conditions`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDescriptor {
    pub table: String,
    pub conditions: Conditions,
    pub column: String,
}

/// Everything a query is configured with besides its table.
///
/// Lives for exactly one terminal call and is back to its default afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    pub conditions: Conditions,
    pub order: Option<OrderSpec>,
    pub limit: Option<LimitSpec>,
    pub relation: Option<RelationDescriptor>,
}

impl ConditionSet {
    pub fn is_empty(&self) -> bool {
        *self == ConditionSet::default()
    }
}
