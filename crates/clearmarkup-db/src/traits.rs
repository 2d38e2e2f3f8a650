//! Core traits that power the query builder.
//!
//! These traits define the contract for:
//! - The data access primitive the builder delegates storage to (`Primitive`)
//! - Building SQL fragments from predicates (`Expression`)

use crate::{
    error::Result,
    query::{
        clause::{LimitSpec, OrderSpec},
        conditions::Conditions,
    },
    value::{Row, Value},
};

/// The underlying data access layer.
///
/// Every operation works on a table name, an optional projection (`None`
/// means all columns) and a condition map. Failures are returned as they
/// come from the storage layer; the builder never retries or translates
/// them.
pub trait Primitive {
    /// Fetches all rows matching `conditions`.
    fn select(
        &self,
        table: &str,
        columns: Option<&[String]>,
        conditions: &Conditions,
        order: Option<&OrderSpec>,
        limit: Option<&LimitSpec>,
    ) -> Result<Vec<Row>>;

    /// Fetches the first row matching `conditions`, if any.
    fn get(
        &self,
        table: &str,
        columns: Option<&[String]>,
        conditions: &Conditions,
        order: Option<&OrderSpec>,
    ) -> Result<Option<Row>>;

    fn has(&self, table: &str, conditions: &Conditions) -> Result<bool>;

    fn count(&self, table: &str, conditions: &Conditions) -> Result<u64>;

    /// Inserts a row and returns the id of the new row.
    fn insert(&self, table: &str, data: &Row) -> Result<i64>;

    /// Updates the matching rows and returns how many were changed.
    fn update(&self, table: &str, data: &Row, conditions: &Conditions) -> Result<usize>;

    /// Deletes the matching rows and returns how many were removed.
    fn delete(&self, table: &str, conditions: &Conditions) -> Result<usize>;

    /// Runs `callback` atomically: its effects are kept only when it returns
    /// `Ok`.
    fn action<T, F>(&self, callback: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>;
}

/// A trait for types that can be converted into SQL expressions.
///
/// When `to_sql` is called, it appends bound parameters to the provided
/// `params` vector and returns the SQL fragment (with `?` placeholders).
pub trait Expression {
    /// Converts this expression into a SQL string fragment and appends bound
    /// parameters.
    fn to_sql(&self, params: &mut Vec<Value>) -> String;
}
