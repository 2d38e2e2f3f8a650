//! The fluent query builder.

use std::mem;

use tracing::{debug, trace};

use crate::{
    error::{DbError, Result},
    query::{
        clause::{LimitSpec, OrderSpec},
        conditions::{ConditionSet, Conditions, RelationDescriptor},
        projection::Projection,
        relation::{RelationResolver, Resolution},
    },
    traits::Primitive,
    value::{Fetched, Row, Value},
};

/// A stateful, chainable query builder over a [`Primitive`].
///
/// Configure the query with [`table`](Db::table), [`filter`](Db::filter),
/// [`order_by`](Db::order_by), [`limit`](Db::limit) and [`rel`](Db::rel),
/// then run one terminal operation. Every terminal operation hands the
/// builder back in its zero state, whichever way it returns, so one builder
/// can serve several queries in sequence but never two at once.
///
/// # Example
///
/// ```rust
/// use clearmarkup_db::{Db, Projection, Row, SqliteDatabase};
///
/// let sqlite = SqliteDatabase::open_in_memory().unwrap();
/// sqlite
///     .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT, status TEXT)")
///     .unwrap();
///
/// let mut db = Db::new(&sqlite);
/// db.table("users")
///     .insert(&Row::new().with("email", " ada@example.com ").with("status", "active"))
///     .unwrap();
///
/// let email = db
///     .table("users")
///     .filter(("status", "active"))
///     .get(Projection::single("email", Some("trim")))
///     .unwrap();
/// assert_eq!(email.and_then(|e| e.into_scalar()), Some("ada@example.com".into()));
/// ```
pub struct Db<'p, P: Primitive> {
    primitive: &'p P,
    table: Option<String>,
    state: ConditionSet,
}

impl<'p, P: Primitive> Db<'p, P> {
    pub fn new(primitive: &'p P) -> Self {
        Self {
            primitive,
            table: None,
            state: ConditionSet::default(),
        }
    }

    /// Sets the target table, replacing any previous one.
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = Some(name.into());
        self
    }

    /// Sets the condition map.
    ///
    /// Replaces whatever an earlier `filter` call set; conditions are never
    /// merged across calls. A `(key, value)` pair is a one-entry map.
    pub fn filter(&mut self, conditions: impl Into<Conditions>) -> &mut Self {
        self.state.conditions = conditions.into();
        self
    }

    /// Sets the order: a column name (ascending), a `(column, direction)`
    /// pair, or a list of pairs.
    pub fn order_by(&mut self, order: impl Into<OrderSpec>) -> &mut Self {
        self.state.order = Some(order.into());
        self
    }

    /// Sets the limit: a row count or an `(offset, count)` pair.
    pub fn limit(&mut self, limit: impl Into<LimitSpec>) -> &mut Self {
        self.state.limit = Some(limit.into());
        self
    }

    /// Restricts the primary table's `id` to the `column` values found in
    /// `table` under `conditions`.
    ///
    /// Only read operations honor the relation. Unlike `filter`, the resolved
    /// ids are merged with the primary conditions.
    pub fn rel(
        &mut self,
        table: impl Into<String>,
        conditions: impl Into<Conditions>,
        column: impl Into<String>,
    ) -> &mut Self {
        self.state.relation = Some(RelationDescriptor {
            table: table.into(),
            conditions: conditions.into(),
            column: column.into(),
        });
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn state(&self) -> &ConditionSet {
        &self.state
    }

    /// Whether the builder is in its zero state.
    pub fn is_reset(&self) -> bool {
        self.table.is_none() && self.state.is_empty()
    }

    /// Drops the whole configuration.
    pub fn reset(&mut self) {
        self.table = None;
        self.state = ConditionSet::default();
    }

    /// Moves the configuration out, leaving the builder reset. Runs first in
    /// every terminal operation so that no exit path can leave state behind.
    fn take(&mut self) -> Result<(String, ConditionSet)> {
        let table = self.table.take();
        let state = mem::take(&mut self.state);
        match table {
            Some(table) if !table.trim().is_empty() => Ok((table, state)),
            _ => Err(DbError::MissingTable),
        }
    }

    fn resolve(&self, relation: Option<&RelationDescriptor>) -> Result<Resolution> {
        RelationResolver::new(self.primitive).resolve(relation)
    }

    /// Fetches every matching row, post-processed by the projection's
    /// transforms.
    pub fn select(&mut self, projection: impl Into<Projection>) -> Result<Vec<Row>> {
        let (table, state) = self.take()?;
        let prepared = projection.into().prepare();

        let resolution = self.resolve(state.relation.as_ref())?;
        if resolution.is_empty() {
            debug!(table = %table, "relation is empty, skipping select");
            return Ok(Vec::new());
        }
        let conditions = resolution.merge_into(state.conditions);

        trace!(table = %table, ?conditions, "select");
        let mut rows = self.primitive.select(
            &table,
            prepared.columns.as_deref(),
            &conditions,
            state.order.as_ref(),
            state.limit.as_ref(),
        )?;
        for row in &mut rows {
            prepared.apply(row);
        }
        Ok(rows)
    }

    /// Fetches the first matching row.
    ///
    /// With exactly one column requested the transformed value itself is
    /// returned instead of a one-column row.
    pub fn get(&mut self, projection: impl Into<Projection>) -> Result<Option<Fetched>> {
        let (table, state) = self.take()?;
        let prepared = projection.into().prepare();

        let resolution = self.resolve(state.relation.as_ref())?;
        if resolution.is_empty() {
            debug!(table = %table, "relation is empty, skipping get");
            return Ok(None);
        }
        let conditions = resolution.merge_into(state.conditions);

        trace!(table = %table, ?conditions, "get");
        let row = self.primitive.get(
            &table,
            prepared.columns.as_deref(),
            &conditions,
            state.order.as_ref(),
        )?;

        let single = prepared.columns.as_ref().is_some_and(|c| c.len() == 1);
        Ok(row.map(|mut row| {
            prepared.apply(&mut row);
            if single {
                Fetched::from(row)
            } else {
                Fetched::Row(row)
            }
        }))
    }

    /// Whether any row matches. An empty relation answers `false` without
    /// querying the primary table.
    pub fn has(&mut self) -> Result<bool> {
        let (table, state) = self.take()?;
        let resolution = self.resolve(state.relation.as_ref())?;
        if resolution.is_empty() {
            debug!(table = %table, "relation is empty, skipping has");
            return Ok(false);
        }
        self.primitive
            .has(&table, &resolution.merge_into(state.conditions))
    }

    /// Counts the matching rows. An empty relation answers `0` without
    /// querying the primary table.
    pub fn count(&mut self) -> Result<u64> {
        let (table, state) = self.take()?;
        let resolution = self.resolve(state.relation.as_ref())?;
        if resolution.is_empty() {
            debug!(table = %table, "relation is empty, skipping count");
            return Ok(0);
        }
        self.primitive
            .count(&table, &resolution.merge_into(state.conditions))
    }

    /// Inserts `data` and returns the new row id.
    pub fn insert(&mut self, data: &Row) -> Result<i64> {
        let (table, _) = self.take()?;
        trace!(table = %table, columns = data.len(), "insert");
        self.primitive.insert(&table, data)
    }

    /// Updates the rows matching the conditions. The relation is ignored.
    pub fn update(&mut self, data: &Row) -> Result<usize> {
        let (table, state) = self.take()?;
        trace!(table = %table, conditions = ?state.conditions, "update");
        self.primitive.update(&table, data, &state.conditions)
    }

    /// Deletes the rows matching the conditions. The relation is ignored.
    pub fn delete(&mut self) -> Result<usize> {
        let (table, state) = self.take()?;
        trace!(table = %table, conditions = ?state.conditions, "delete");
        self.primitive.delete(&table, &state.conditions)
    }

    /// Runs `callback` through the primitive's atomic execution. Builder
    /// state is left untouched.
    pub fn transaction<T, F>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(&P) -> Result<T>,
    {
        self.primitive.action(callback)
    }

    /// Looks up the `id` of the row whose `selector` column equals `value`.
    /// Does not touch the builder's state.
    pub fn id_from_selector(
        &self,
        table: &str,
        selector: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        let columns = ["id".to_string()];
        let conditions = Conditions::from((selector, value.into()));
        let row = self
            .primitive
            .get(table, Some(&columns), &conditions, None)?;
        Ok(row.and_then(|row| row.get("id").cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::{clause::Direction, conditions::ConditionValue},
        test_utils::RecordingPrimitive,
    };

    fn users() -> RecordingPrimitive {
        RecordingPrimitive::default()
            .with_rows(
                "users",
                vec![
                    Row::new()
                        .with("id", 5)
                        .with("email", "  five@example.com ")
                        .with("bio", "<b>hello</b> world"),
                    Row::new()
                        .with("id", 9)
                        .with("email", "nine@example.com")
                        .with("bio", ""),
                ],
            )
            .with_rows(
                "teams",
                vec![Row::new().with("owner_id", 5), Row::new().with("owner_id", 9)],
            )
    }

    fn configure<P: Primitive>(db: &mut Db<'_, P>) {
        db.table("users")
            .filter(("status", "active"))
            .order_by(("id", Direction::Desc))
            .limit((10u64, 5u64))
            .rel("teams", ("region", "EU"), "owner_id");
    }

    #[test]
    fn test_every_terminal_operation_resets_state() {
        let primitive = users();
        let mut db = Db::new(&primitive);
        let data = Row::new().with("email", "x@example.com");

        configure(&mut db);
        assert!(!db.is_reset());
        db.select("*").unwrap();
        assert!(db.is_reset());

        configure(&mut db);
        db.get("*").unwrap();
        assert!(db.is_reset());

        configure(&mut db);
        db.has().unwrap();
        assert!(db.is_reset());

        configure(&mut db);
        db.count().unwrap();
        assert!(db.is_reset());

        configure(&mut db);
        db.insert(&data).unwrap();
        assert!(db.is_reset());

        configure(&mut db);
        db.update(&data).unwrap();
        assert!(db.is_reset());

        configure(&mut db);
        db.delete().unwrap();
        assert!(db.is_reset());
    }

    #[test]
    fn test_state_resets_on_early_returns() {
        let primitive = RecordingPrimitive::default();
        let mut db = Db::new(&primitive);

        configure(&mut db);
        assert!(db.select("*").unwrap().is_empty());
        assert!(db.is_reset());

        db.filter(("status", "active")).limit(1u64);
        assert!(matches!(db.count(), Err(DbError::MissingTable)));
        assert!(db.is_reset());

        db.table("  ").filter(("status", "active"));
        assert!(matches!(db.select("*"), Err(DbError::MissingTable)));
        assert!(db.is_reset());
        assert!(primitive.calls_to("users").is_empty());
    }

    #[test]
    fn test_empty_relation_skips_primary_query() {
        let primitive = RecordingPrimitive::default().with_rows("users", vec![Row::new()]);
        let mut db = Db::new(&primitive);

        let rel = |db: &mut Db<'_, RecordingPrimitive>| {
            db.table("users").rel("teams", ("region", "EU"), "owner_id");
        };

        rel(&mut db);
        assert!(db.select(["id"]).unwrap().is_empty());
        rel(&mut db);
        assert_eq!(db.get(["id"]).unwrap(), None);
        rel(&mut db);
        assert!(!db.has().unwrap());
        rel(&mut db);
        assert_eq!(db.count().unwrap(), 0);

        assert!(primitive.calls_to("users").is_empty());
        assert_eq!(primitive.calls_to("teams").len(), 4);
    }

    #[test]
    fn test_relation_scenario() {
        let primitive = users();
        let mut db = Db::new(&primitive);

        let rows = db
            .table("users")
            .filter(("status", "active"))
            .rel("teams", ("region", "EU"), "owner_id")
            .select(["id", "email"])
            .unwrap();

        let calls = primitive.calls();
        assert_eq!(calls.len(), 2);

        assert_eq!(calls[0].table, "teams");
        assert_eq!(calls[0].columns, Some(vec!["owner_id".to_string()]));
        assert_eq!(calls[0].conditions, Conditions::from(("region", "EU")));

        assert_eq!(calls[1].table, "users");
        assert_eq!(
            calls[1].columns,
            Some(vec!["id".to_string(), "email".to_string()])
        );
        assert_eq!(
            calls[1].conditions.get("status"),
            Some(&ConditionValue::Value("active".into()))
        );
        assert_eq!(
            calls[1].conditions.get("id"),
            Some(&ConditionValue::List(vec![
                Value::Integer(5),
                Value::Integer(9)
            ]))
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("email"),
            Some(&Value::from("  five@example.com "))
        );
        assert!(db.is_reset());
    }

    #[test]
    fn test_filter_replaces_previous_conditions() {
        let primitive = users();
        let mut db = Db::new(&primitive);
        db.table("users")
            .filter(("status", "active"))
            .filter(("role", "admin"))
            .count()
            .unwrap();

        let calls = primitive.calls();
        assert_eq!(calls[0].conditions, Conditions::from(("role", "admin")));
    }

    #[test]
    fn test_order_and_limit_are_passed_through() {
        let primitive = users();
        let mut db = Db::new(&primitive);
        db.table("users")
            .order_by("email")
            .limit(3u64)
            .select("*")
            .unwrap();

        let call = &primitive.calls()[0];
        assert_eq!(call.columns, None);
        assert_eq!(call.order, Some(OrderSpec::from("email")));
        assert_eq!(call.limit, Some(LimitSpec::Count(3)));
    }

    #[test]
    fn test_transforms_apply_to_projected_columns() {
        let primitive = users();
        let mut db = Db::new(&primitive);
        let rows = db
            .table("users")
            .select(
                Projection::columns()
                    .column("id")
                    .pipe("email", "trim")
                    .pipe("bio", "strip_tags|empty_string_to_null")
                    .map("missing", |_| Value::from("never")),
            )
            .unwrap();

        assert_eq!(rows[0].get("email"), Some(&Value::from("five@example.com")));
        assert_eq!(rows[0].get("bio"), Some(&Value::from("hello world")));
        assert_eq!(rows[1].get("bio"), Some(&Value::Null));
        assert!(rows[0].get("missing").is_none());
    }

    #[test]
    fn test_wildcard_ignores_transforms() {
        let primitive = users();
        let mut db = Db::new(&primitive);
        let rows = db.table("users").select("*").unwrap();
        assert_eq!(
            rows[0].get("email"),
            Some(&Value::from("  five@example.com "))
        );

        let row = db.table("users").get("*").unwrap();
        assert!(matches!(row, Some(Fetched::Row(row)) if row.len() == 3));
    }

    #[test]
    fn test_get_unwraps_single_column() {
        let primitive = users();
        let mut db = Db::new(&primitive);

        let email = db
            .table("users")
            .get(Projection::single("email", Some("trim|truncate:4")))
            .unwrap();
        assert_eq!(email, Some(Fetched::Scalar(Value::from("five..."))));

        let row = db.table("users").get(["id", "email"]).unwrap();
        match row {
            Some(Fetched::Row(row)) => assert_eq!(row.len(), 2),
            other => panic!("expected a row, got {other:?}"),
        }

        let none = db.table("missing").get("id").unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_count_without_conditions() {
        let primitive = users();
        let mut db = Db::new(&primitive);
        assert_eq!(db.table("users").count().unwrap(), 2);
        assert!(primitive.calls()[0].conditions.is_empty());
    }

    #[test]
    fn test_writes_ignore_relation() {
        let primitive = users();
        let mut db = Db::new(&primitive);

        db.table("users")
            .filter(("id", 5))
            .rel("teams", ("region", "EU"), "owner_id")
            .update(&Row::new().with("status", "banned"))
            .unwrap();
        db.table("users")
            .filter(("id", 9))
            .rel("teams", ("region", "EU"), "owner_id")
            .delete()
            .unwrap();

        assert!(primitive.calls_to("teams").is_empty());
        let calls = primitive.calls();
        assert_eq!(calls[0].method, "update");
        assert_eq!(calls[0].conditions, Conditions::from(("id", 5)));
        assert_eq!(calls[1].method, "delete");
    }

    #[test]
    fn test_transaction_and_selector_keep_state() {
        let primitive = users();
        let mut db = Db::new(&primitive);
        db.table("users").filter(("status", "active"));

        let inserted = db
            .transaction(|p| p.insert("users", &Row::new().with("id", 10)))
            .unwrap();
        assert_eq!(inserted, 3);

        let id = db.id_from_selector("users", "email", "five@example.com").unwrap();
        assert_eq!(id, Some(Value::Integer(5)));

        assert_eq!(db.table_name(), Some("users"));
        assert!(!db.state().is_empty());
    }
}
