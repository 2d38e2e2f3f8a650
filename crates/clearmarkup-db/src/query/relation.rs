//! One-hop relation resolution.

use tracing::debug;

use crate::{
    error::Result,
    query::conditions::{Conditions, RelationDescriptor},
    traits::Primitive,
    value::Value,
};

/// Outcome of resolving a relation against the related table.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No relation was configured; the primary conditions are used as is.
    Unrestricted,
    /// The primary table's `id` is restricted to these values.
    Ids(Vec<Value>),
    /// The related lookup found nothing; the primary query can't match.
    Empty,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        matches!(self, Resolution::Empty)
    }

    /// Folds the resolved id set into `conditions`, keeping every primary
    /// condition alongside the `id` restriction.
    pub fn merge_into(self, conditions: Conditions) -> Conditions {
        match self {
            Resolution::Ids(ids) => conditions.merge(Conditions::from(("id", ids))),
            Resolution::Unrestricted | Resolution::Empty => conditions,
        }
    }
}

/// Resolves [`RelationDescriptor`]s through a [`Primitive`].
pub struct RelationResolver<'p, P: Primitive> {
    primitive: &'p P,
}

impl<'p, P: Primitive> RelationResolver<'p, P> {
    pub fn new(primitive: &'p P) -> Self {
        Self { primitive }
    }

    /// Fetches the join column of the related table under the relation's
    /// own conditions. Null join values are dropped.
    pub fn resolve(&self, relation: Option<&RelationDescriptor>) -> Result<Resolution> {
        let Some(relation) = relation else {
            return Ok(Resolution::Unrestricted);
        };

        let columns = [relation.column.clone()];
        let rows = self.primitive.select(
            &relation.table,
            Some(&columns),
            &relation.conditions,
            None,
            None,
        )?;

        let ids = rows
            .into_iter()
            .filter_map(|row| row.get(&relation.column).cloned())
            .filter(|value| !value.is_null())
            .collect::<Vec<_>>();

        debug!(
            table = %relation.table,
            column = %relation.column,
            ids = ids.len(),
            "resolved relation"
        );

        if ids.is_empty() {
            Ok(Resolution::Empty)
        } else {
            Ok(Resolution::Ids(ids))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{query::conditions::ConditionValue, test_utils::RecordingPrimitive, value::Row};

    fn teams() -> RelationDescriptor {
        RelationDescriptor {
            table: "teams".into(),
            conditions: Conditions::from(("region", "EU")),
            column: "owner_id".into(),
        }
    }

    #[test]
    fn test_no_relation_is_unrestricted() {
        let primitive = RecordingPrimitive::default();
        let resolution = RelationResolver::new(&primitive).resolve(None).unwrap();
        assert_eq!(resolution, Resolution::Unrestricted);
        assert!(primitive.calls().is_empty());
    }

    #[test]
    fn test_resolves_ids_and_drops_nulls() {
        let primitive = RecordingPrimitive::default().with_rows(
            "teams",
            vec![
                Row::new().with("owner_id", 5),
                Row::new().with("owner_id", Value::Null),
                Row::new().with("owner_id", 9),
            ],
        );
        let resolution = RelationResolver::new(&primitive)
            .resolve(Some(&teams()))
            .unwrap();
        assert_eq!(
            resolution,
            Resolution::Ids(vec![Value::Integer(5), Value::Integer(9)])
        );

        let calls = primitive.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].table, "teams");
        assert_eq!(calls[0].columns, Some(vec!["owner_id".to_string()]));
        assert_eq!(calls[0].conditions, Conditions::from(("region", "EU")));
    }

    #[test]
    fn test_empty_related_set() {
        let primitive = RecordingPrimitive::default();
        let resolution = RelationResolver::new(&primitive)
            .resolve(Some(&teams()))
            .unwrap();
        assert!(resolution.is_empty());
    }

    #[test]
    fn test_merge_keeps_primary_conditions() {
        let merged = Resolution::Ids(vec![Value::Integer(5)])
            .merge_into(Conditions::from(("status", "active")));
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.get("id"),
            Some(&ConditionValue::List(vec![Value::Integer(5)]))
        );
    }
}
