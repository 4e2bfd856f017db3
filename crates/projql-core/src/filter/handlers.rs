//! Filter operator handlers.

use projql_proto::{FilterOperator, FilterValue};

use crate::criteria::{Comparison, Expr, Predicate};
use crate::error::{Error, Result};

/// Builds a predicate for one filter operator.
pub trait FilterOperatorHandler: Send + Sync {
    /// Build the predicate for `path OPERATOR value`.
    fn to_predicate(&self, path: Expr, value: &FilterValue) -> Result<Predicate>;
}

impl<F> FilterOperatorHandler for F
where
    F: Fn(Expr, &FilterValue) -> Result<Predicate> + Send + Sync,
{
    fn to_predicate(&self, path: Expr, value: &FilterValue) -> Result<Predicate> {
        self(path, value)
    }
}

fn invalid(operator: FilterOperator, expected: &'static str, value: &FilterValue) -> Error {
    Error::InvalidArgument {
        operator: operator.name().to_string(),
        expected,
        value: value.to_string(),
    }
}

/// Binary comparison against a single value.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonHandler {
    operator: FilterOperator,
    comparison: Comparison,
}

impl ComparisonHandler {
    /// Handler for `operator` using `comparison`.
    pub fn new(operator: FilterOperator, comparison: Comparison) -> Self {
        Self {
            operator,
            comparison,
        }
    }
}

impl FilterOperatorHandler for ComparisonHandler {
    fn to_predicate(&self, path: Expr, value: &FilterValue) -> Result<Predicate> {
        match value {
            FilterValue::Scalar(v) => Ok(Predicate::compare(path, self.comparison, v.clone())),
            other => Err(invalid(self.operator, "a single value", other)),
        }
    }
}

/// `LIKE`; the operand is used through its text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikeHandler;

impl FilterOperatorHandler for LikeHandler {
    fn to_predicate(&self, path: Expr, value: &FilterValue) -> Result<Predicate> {
        let pattern = match value {
            FilterValue::Scalar(projql_proto::Value::String(s)) => s.clone(),
            other => other.to_string(),
        };
        Ok(Predicate::Like {
            expr: path,
            pattern,
        })
    }
}

/// `IN` and `NOT IN`.
#[derive(Debug, Clone, Copy)]
pub struct MembershipHandler {
    negated: bool,
}

impl MembershipHandler {
    /// `IN (...)`
    pub fn is_in() -> Self {
        Self { negated: false }
    }

    /// `NOT IN (...)`
    pub fn not_in() -> Self {
        Self { negated: true }
    }

    fn operator(&self) -> FilterOperator {
        if self.negated {
            FilterOperator::NotIn
        } else {
            FilterOperator::In
        }
    }
}

impl FilterOperatorHandler for MembershipHandler {
    fn to_predicate(&self, path: Expr, value: &FilterValue) -> Result<Predicate> {
        let FilterValue::List(values) = value else {
            return Err(invalid(self.operator(), "a list of values", value));
        };
        let predicate = Predicate::In {
            expr: path,
            values: values.clone(),
        };
        Ok(if self.negated {
            predicate.not()
        } else {
            predicate
        })
    }
}

/// Inclusive `BETWEEN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetweenHandler;

impl FilterOperatorHandler for BetweenHandler {
    fn to_predicate(&self, path: Expr, value: &FilterValue) -> Result<Predicate> {
        let FilterValue::Range(range) = value else {
            return Err(invalid(FilterOperator::Between, "a range value", value));
        };
        Ok(Predicate::Between {
            expr: path,
            low: range.start().clone(),
            high: range.end().clone(),
        })
    }
}

/// Handler for each standard operator.
pub fn standard_handler(operator: FilterOperator) -> Box<dyn FilterOperatorHandler> {
    match operator {
        FilterOperator::Equal => Box::new(ComparisonHandler::new(operator, Comparison::Eq)),
        FilterOperator::NotEqual => Box::new(ComparisonHandler::new(operator, Comparison::Ne)),
        FilterOperator::GreaterThan => Box::new(ComparisonHandler::new(operator, Comparison::Gt)),
        FilterOperator::LessThan => Box::new(ComparisonHandler::new(operator, Comparison::Lt)),
        FilterOperator::GreaterThanOrEqual => {
            Box::new(ComparisonHandler::new(operator, Comparison::Ge))
        }
        FilterOperator::LessThanOrEqual => {
            Box::new(ComparisonHandler::new(operator, Comparison::Le))
        }
        FilterOperator::Like => Box::new(LikeHandler),
        FilterOperator::In => Box::new(MembershipHandler::is_in()),
        FilterOperator::NotIn => Box::new(MembershipHandler::not_in()),
        FilterOperator::Between => Box::new(BetweenHandler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::NodeId;
    use projql_proto::{BetweenValues, Value};

    fn age() -> Expr {
        Expr::attribute(NodeId::ROOT, "age")
    }

    #[test]
    fn test_between_builds_inclusive_range() {
        let range = FilterValue::Range(BetweenValues::new(18, 65).unwrap());
        let predicate = BetweenHandler.to_predicate(age(), &range).unwrap();
        assert_eq!(
            predicate,
            Predicate::Between {
                expr: age(),
                low: Value::Int32(18),
                high: Value::Int32(65)
            }
        );
    }

    #[test]
    fn test_between_rejects_scalar() {
        let err = BetweenHandler
            .to_predicate(age(), &FilterValue::Scalar(Value::Int32(18)))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "BETWEEN operator requires a range value. Provided: 18"
        );
    }

    #[test]
    fn test_membership_requires_list() {
        let err = MembershipHandler::not_in()
            .to_predicate(age(), &FilterValue::Scalar(Value::Int32(3)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { ref operator, .. } if operator == "NOT_IN"));

        let predicate = MembershipHandler::not_in()
            .to_predicate(age(), &FilterValue::List(vec![Value::Int32(3)]))
            .unwrap();
        assert!(matches!(predicate, Predicate::Not(_)));
    }

    #[test]
    fn test_like_coerces_to_text() {
        let predicate = LikeHandler
            .to_predicate(age(), &FilterValue::Scalar(Value::Int32(4)))
            .unwrap();
        assert_eq!(
            predicate,
            Predicate::Like {
                expr: age(),
                pattern: "4".into()
            }
        );
    }

    #[test]
    fn test_comparison_rejects_list() {
        let handler = standard_handler(FilterOperator::GreaterThan);
        assert!(handler
            .to_predicate(age(), &FilterValue::List(vec![Value::Int32(1)]))
            .is_err());
    }
}
