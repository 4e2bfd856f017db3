//! Select operator handlers.

use projql_proto::AggregateFunction;

use crate::criteria::Expr;

/// Transforms a resolved path into a selected expression.
pub trait SelectOperatorHandler: Send + Sync {
    /// Whether the produced expression aggregates over a group.
    fn is_aggregate(&self) -> bool;

    /// Build the selected expression from the resolved path.
    fn apply(&self, path: Expr) -> Expr;
}

/// Selects the path unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHandler;

impl SelectOperatorHandler for IdentityHandler {
    fn is_aggregate(&self) -> bool {
        false
    }

    fn apply(&self, path: Expr) -> Expr {
        path
    }
}

/// Wraps the path in an aggregate function.
#[derive(Debug, Clone, Copy)]
pub struct AggregateHandler(pub AggregateFunction);

impl SelectOperatorHandler for AggregateHandler {
    fn is_aggregate(&self) -> bool {
        true
    }

    fn apply(&self, path: Expr) -> Expr {
        path.aggregate(self.0)
    }
}

/// Absolute value of the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsHandler;

impl SelectOperatorHandler for AbsHandler {
    fn is_aggregate(&self) -> bool {
        false
    }

    fn apply(&self, path: Expr) -> Expr {
        path.abs()
    }
}
