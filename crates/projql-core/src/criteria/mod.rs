//! Backend-neutral query representation.
//!
//! A [`CriteriaQuery`] owns an arena of navigation nodes (the root entity and
//! every join created from it) plus the selection, grouping, predicate,
//! ordering and paging clauses assembled by the processor. Backends execute
//! it; path resolution talks to it through the [`Navigator`] trait.

mod expr;
mod query;

pub use expr::{Comparison, Expr, Order, Predicate, Selection};
pub use query::{CriteriaQuery, JoinEdge, Navigator, Node, NodeId};
