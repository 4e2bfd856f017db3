//! Translation of filter trees into criteria predicates.

use projql_proto::{CompoundOperator, FilterExpr, FilterLeaf};
use tracing::trace;

use super::OperatorRegistry;
use crate::criteria::Predicate;
use crate::error::Result;
use crate::resolver::PathContext;

/// Compile a filter expression against the query bound to `ctx`.
///
/// Operator lookup happens before the path is resolved, so an unknown
/// operator never adds joins to the query. Compound children are compiled
/// in declaration order.
pub fn compile(
    expr: &FilterExpr,
    ctx: &mut PathContext<'_, '_>,
    registry: &OperatorRegistry,
) -> Result<Predicate> {
    match expr {
        FilterExpr::Leaf(leaf) => compile_leaf(leaf, ctx, registry),
        FilterExpr::Compound(compound) => {
            let children = compound
                .filters()
                .iter()
                .map(|child| compile(child, ctx, registry))
                .collect::<Result<Vec<_>>>()?;
            Ok(match compound.operator() {
                CompoundOperator::And => Predicate::And(children),
                CompoundOperator::Or => Predicate::Or(children),
            })
        }
    }
}

fn compile_leaf(
    leaf: &FilterLeaf,
    ctx: &mut PathContext<'_, '_>,
    registry: &OperatorRegistry,
) -> Result<Predicate> {
    let handler = registry.get(&leaf.operator)?;
    let path = ctx.path(&leaf.path)?;
    let predicate = handler.to_predicate(path, &leaf.value)?;
    trace!(filter = %leaf.path, %predicate, "compiled filter");
    Ok(predicate)
}
