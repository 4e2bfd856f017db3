//! Path resolution bound to one query build.

use crate::criteria::{CriteriaQuery, Expr, NodeId};
use crate::error::Result;

use super::PathResolver;

/// A criteria query together with the resolver that owns its join cache.
///
/// Filters, specifications, selections and orders all resolve their paths
/// through the same context so that they share joins.
pub struct PathContext<'a, 'c> {
    query: &'a mut CriteriaQuery<'c>,
    resolver: &'a mut PathResolver,
    root: NodeId,
}

impl<'a, 'c> PathContext<'a, 'c> {
    /// Bind a resolver to a query, resolving from the query root.
    pub fn new(query: &'a mut CriteriaQuery<'c>, resolver: &'a mut PathResolver) -> Self {
        let root = query.root();
        Self {
            query,
            resolver,
            root,
        }
    }

    /// Resolve a dotted path from the root.
    pub fn path(&mut self, path: &str) -> Result<Expr> {
        self.resolver.resolve(&mut *self.query, self.root, path)
    }
}
