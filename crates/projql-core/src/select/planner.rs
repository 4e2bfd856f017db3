//! Selection planning.

use tracing::debug;

use super::SelectOperatorRegistry;
use crate::criteria::{Expr, Selection};
use crate::error::Result;
use crate::resolver::PathContext;
use crate::shape::SelectionField;

/// Planned selection list and derived grouping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionPlan {
    /// Aliased selections in field declaration order.
    pub selections: Vec<Selection>,
    /// Grouping expressions; empty unless some selection aggregates.
    pub group_by: Vec<Expr>,
}

impl SelectionPlan {
    /// Check if any selection aggregates.
    pub fn has_aggregates(&self) -> bool {
        self.selections.iter().any(|s| s.expr.is_aggregate())
    }
}

/// Resolve and transform every field, then derive the group-by set.
///
/// When at least one selector is an aggregate, every non-aggregate selection
/// becomes a grouping expression, in declaration order.
pub fn plan(
    fields: &[SelectionField],
    ctx: &mut PathContext<'_, '_>,
    registry: &SelectOperatorRegistry,
) -> Result<SelectionPlan> {
    let mut selections = Vec::with_capacity(fields.len());
    let mut plain = Vec::new();
    let mut aggregated = false;

    for field in fields {
        let handler = registry.get(&field.selector)?;
        let path = ctx.path(&field.source_path)?;
        let expr = handler.apply(path);
        if handler.is_aggregate() {
            aggregated = true;
        } else {
            plain.push(expr.clone());
        }
        selections.push(Selection::new(field.output_name.clone(), expr));
    }

    let group_by = if aggregated { plain } else { Vec::new() };
    debug!(
        selections = selections.len(),
        group_by = group_by.len(),
        "planned selections"
    );
    Ok(SelectionPlan {
        selections,
        group_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EntityDef, FieldDef, ScalarType, SchemaBundle};
    use crate::config::ProcessorConfig;
    use crate::criteria::{CriteriaQuery, NodeId};
    use crate::resolver::PathResolver;
    use projql_proto::{AggregateFunction, SelectorKind};

    fn catalog() -> Catalog {
        let customer = EntityDef::new("Customer", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("age", ScalarType::Int32))
            .with_field(FieldDef::scalar("balance", ScalarType::Int64));
        Catalog::new(SchemaBundle::new(1).with_entity(customer)).unwrap()
    }

    fn run(fields: &[SelectionField]) -> SelectionPlan {
        let catalog = catalog();
        let mut query = CriteriaQuery::new(&catalog, "Customer").unwrap();
        let mut resolver = PathResolver::new(&[], &ProcessorConfig::default()).unwrap();
        let mut ctx = PathContext::new(&mut query, &mut resolver);
        plan(fields, &mut ctx, &SelectOperatorRegistry::standard()).unwrap()
    }

    #[test]
    fn test_group_by_derived_from_plain_selections() {
        let plan = run(&[
            SelectionField::new("count", "id").with_selector(SelectorKind::COUNT),
            SelectionField::new("age", "age"),
        ]);
        let age = Expr::attribute(NodeId::ROOT, "age");
        assert_eq!(plan.group_by, vec![age]);
        assert_eq!(
            plan.selections[0].expr,
            Expr::attribute(NodeId::ROOT, "id").aggregate(AggregateFunction::Count)
        );
        assert_eq!(plan.selections[1].alias, "age");
    }

    #[test]
    fn test_no_group_by_without_aggregates() {
        let plan = run(&[
            SelectionField::new("age", "age"),
            SelectionField::new("balance", "balance").with_selector(SelectorKind::ABS),
        ]);
        assert!(plan.group_by.is_empty());
        assert!(!plan.has_aggregates());
    }

    #[test]
    fn test_group_by_uses_transformed_expression() {
        let plan = run(&[
            SelectionField::new("balance", "balance").with_selector(SelectorKind::ABS),
            SelectionField::new("total", "balance").with_selector(SelectorKind::SUM),
        ]);
        assert_eq!(
            plan.group_by,
            vec![Expr::attribute(NodeId::ROOT, "balance").abs()]
        );
    }
}
