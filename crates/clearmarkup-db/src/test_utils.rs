//! A recording [`Primitive`] for builder tests.

use std::{cell::RefCell, collections::HashMap};

use crate::{
    error::Result,
    query::{
        clause::{LimitSpec, OrderSpec},
        conditions::Conditions,
    },
    traits::Primitive,
    value::Row,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub conditions: Conditions,
    pub order: Option<OrderSpec>,
    pub limit: Option<LimitSpec>,
    pub data: Option<Row>,
}

impl Call {
    fn new(method: &'static str, table: &str, conditions: &Conditions) -> Self {
        Self {
            method,
            table: table.to_string(),
            columns: None,
            conditions: conditions.clone(),
            order: None,
            limit: None,
            data: None,
        }
    }
}

/// Serves canned rows per table, ignoring conditions, and records every
/// call it receives.
#[derive(Default)]
pub struct RecordingPrimitive {
    rows: HashMap<String, Vec<Row>>,
    calls: RefCell<Vec<Call>>,
}

impl RecordingPrimitive {
    pub fn with_rows(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.rows.insert(table.to_string(), rows);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, table: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.table == table)
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn rows(&self, table: &str, columns: Option<&[String]>) -> Vec<Row> {
        let rows = self.rows.get(table).cloned().unwrap_or_default();
        match columns {
            None => rows,
            Some(columns) => rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .filter(|(name, _)| columns.contains(name))
                        .collect()
                })
                .collect(),
        }
    }
}

impl Primitive for RecordingPrimitive {
    fn select(
        &self,
        table: &str,
        columns: Option<&[String]>,
        conditions: &Conditions,
        order: Option<&OrderSpec>,
        limit: Option<&LimitSpec>,
    ) -> Result<Vec<Row>> {
        self.record(Call {
            columns: columns.map(<[String]>::to_vec),
            order: order.cloned(),
            limit: limit.cloned(),
            ..Call::new("select", table, conditions)
        });
        Ok(self.rows(table, columns))
    }

    fn get(
        &self,
        table: &str,
        columns: Option<&[String]>,
        conditions: &Conditions,
        order: Option<&OrderSpec>,
    ) -> Result<Option<Row>> {
        self.record(Call {
            columns: columns.map(<[String]>::to_vec),
            order: order.cloned(),
            ..Call::new("get", table, conditions)
        });
        Ok(self.rows(table, columns).into_iter().next())
    }

    fn has(&self, table: &str, conditions: &Conditions) -> Result<bool> {
        self.record(Call::new("has", table, conditions));
        Ok(!self.rows(table, None).is_empty())
    }

    fn count(&self, table: &str, conditions: &Conditions) -> Result<u64> {
        self.record(Call::new("count", table, conditions));
        Ok(self.rows(table, None).len() as u64)
    }

    fn insert(&self, table: &str, data: &Row) -> Result<i64> {
        self.record(Call {
            data: Some(data.clone()),
            ..Call::new("insert", table, &Conditions::new())
        });
        Ok(self.rows(table, None).len() as i64 + 1)
    }

    fn update(&self, table: &str, data: &Row, conditions: &Conditions) -> Result<usize> {
        self.record(Call {
            data: Some(data.clone()),
            ..Call::new("update", table, conditions)
        });
        Ok(self.rows(table, None).len())
    }

    fn delete(&self, table: &str, conditions: &Conditions) -> Result<usize> {
        self.record(Call::new("delete", table, conditions));
        Ok(self.rows(table, None).len())
    }

    fn action<T, F>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.record(Call::new("action", "", &Conditions::new()));
        callback(self)
    }
}
