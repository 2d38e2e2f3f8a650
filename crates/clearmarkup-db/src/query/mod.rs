//! The query builder.
//!
//! [`Db`] is a stateful, chainable facade over a [`Primitive`]: it collects
//! a table, a condition map, an order, a limit and an optional one-hop
//! relation, then turns one terminal call into calls on the primitive and
//! post-processes the returned rows.
//!
//! # Example
//!
//! ```ignore
//! let rows = Db::new(&sqlite)
//!     .table("users")
//!     .filter(("status", "active"))
//!     .rel("teams", ("region", "EU"), "owner_id")
//!     .order_by(("id", Direction::Desc))
//!     .limit(10u64)
//!     .select(Projection::columns().column("id").pipe("email", "trim|email"))?;
//! ```
//!
//! # Submodules
//!
//! - [`builder`]: the [`Db`] builder and its terminal operations.
//! - [`clause`]: ORDER BY and LIMIT specifications.
//! - [`conditions`]: condition maps and the per-query [`ConditionSet`].
//! - [`projection`]: column projections and their transforms.
//! - [`relation`]: resolution of the one-hop relation.
//!
//! [`Primitive`]: crate::traits::Primitive

pub mod builder;
pub mod clause;
pub mod conditions;
pub mod projection;
pub mod relation;

pub use builder::Db;
pub use clause::{Direction, LimitSpec, OrderClause, OrderSpec};
pub use conditions::{ConditionSet, ConditionValue, Conditions, RelationDescriptor};
pub use projection::{PreparedQuery, Projection, ProjectionEntry};
pub use relation::{RelationResolver, Resolution};
