//! Selection, predicate and ordering expressions of a criteria query.

use std::fmt;

use projql_proto::{AggregateFunction, OrderDirection, Value};

use super::NodeId;

/// A value-producing expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A scalar attribute of a navigation node.
    Attribute {
        /// Owning node.
        node: NodeId,
        /// Field name on the node's entity.
        name: String,
    },
    /// A constant.
    Literal(Value),
    /// Aggregate over the rows of a group.
    Aggregate {
        /// Aggregate function.
        function: AggregateFunction,
        /// Aggregated expression.
        arg: Box<Expr>,
    },
    /// Absolute value.
    Abs(Box<Expr>),
}

impl Expr {
    /// Attribute `name` of `node`.
    pub fn attribute(node: NodeId, name: impl Into<String>) -> Self {
        Expr::Attribute {
            node,
            name: name.into(),
        }
    }

    /// Constant expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Wrap in an aggregate function.
    pub fn aggregate(self, function: AggregateFunction) -> Self {
        Expr::Aggregate {
            function,
            arg: Box::new(self),
        }
    }

    /// Wrap in `ABS`.
    pub fn abs(self) -> Self {
        Expr::Abs(Box::new(self))
    }

    /// Check if the expression contains an aggregate.
    pub fn is_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Abs(inner) => inner.is_aggregate(),
            Expr::Attribute { .. } | Expr::Literal(_) => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Attribute { node, name } => write!(f, "{node}.{name}"),
            Expr::Literal(Value::String(s)) => write!(f, "'{s}'"),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Aggregate { function, arg } => write!(f, "{function}({arg})"),
            Expr::Abs(inner) => write!(f, "ABS({inner})"),
        }
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
        };
        f.write_str(symbol)
    }
}

/// A boolean expression over rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `left op right`
    Compare {
        /// Left operand.
        left: Expr,
        /// Operator.
        op: Comparison,
        /// Right operand.
        right: Expr,
    },
    /// `expr LIKE pattern`
    Like {
        /// Matched expression.
        expr: Expr,
        /// Pattern with `%` and `_` wildcards.
        pattern: String,
    },
    /// `expr IN (values...)`
    In {
        /// Tested expression.
        expr: Expr,
        /// Candidate values.
        values: Vec<Value>,
    },
    /// `expr BETWEEN low AND high` (inclusive)
    Between {
        /// Tested expression.
        expr: Expr,
        /// Lower bound.
        low: Value,
        /// Upper bound.
        high: Value,
    },
    /// `expr IS NULL`
    IsNull(Expr),
    /// Negation.
    Not(Box<Predicate>),
    /// Conjunction of all children.
    And(Vec<Predicate>),
    /// Disjunction of all children.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// `expr op value`
    pub fn compare(expr: Expr, op: Comparison, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            left: expr,
            op,
            right: Expr::Literal(value.into()),
        }
    }

    /// Negate a predicate.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            Predicate::Like { expr, pattern } => write!(f, "{expr} LIKE '{pattern}'"),
            Predicate::In { expr, values } => {
                write!(f, "{expr} IN (")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Predicate::Between { expr, low, high } => {
                write!(f, "{expr} BETWEEN {low} AND {high}")
            }
            Predicate::IsNull(expr) => write!(f, "{expr} IS NULL"),
            Predicate::Not(inner) => write!(f, "NOT ({inner})"),
            Predicate::And(items) => write_joined(f, items, "AND"),
            Predicate::Or(items) => write_joined(f, items, "OR"),
        }
    }
}

/// An aliased output column.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Output column name.
    pub alias: String,
    /// Selected expression.
    pub expr: Expr,
}

impl Selection {
    /// Create a selection.
    pub fn new(alias: impl Into<String>, expr: Expr) -> Self {
        Self {
            alias: alias.into(),
            expr,
        }
    }
}

/// A sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Sorted expression.
    pub expr: Expr,
    /// Direction.
    pub direction: OrderDirection,
}
