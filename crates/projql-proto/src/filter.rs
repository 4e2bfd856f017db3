//! Filter expression tree.
//!
//! A filter is either a [`FilterLeaf`] (`path OPERATOR value`) or a
//! [`CompoundFilter`] combining child expressions with AND/OR. Operators are
//! referenced by name so that custom operators registered at runtime can be
//! used the same way as the standard set in [`FilterOperator`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// Standard filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    /// `path = value`
    Equal,
    /// `path <> value`
    NotEqual,
    /// `path > value`
    GreaterThan,
    /// `path < value`
    LessThan,
    /// `path >= value`
    GreaterThanOrEqual,
    /// `path <= value`
    LessThanOrEqual,
    /// `path LIKE value`
    Like,
    /// `path IN (values...)`
    In,
    /// `path NOT IN (values...)`
    NotIn,
    /// `path BETWEEN start AND end`
    Between,
}

impl FilterOperator {
    /// All standard operators, in registration order.
    pub const ALL: [FilterOperator; 10] = [
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::GreaterThan,
        FilterOperator::LessThan,
        FilterOperator::GreaterThanOrEqual,
        FilterOperator::LessThanOrEqual,
        FilterOperator::Like,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Between,
    ];

    /// Registry name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "EQUAL",
            FilterOperator::NotEqual => "NOT_EQUAL",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            FilterOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            FilterOperator::Like => "LIKE",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT_IN",
            FilterOperator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.name().to_string()
    }
}

/// Inclusive range operand for BETWEEN. Neither bound may be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeRepr", into = "RangeRepr")]
pub struct BetweenValues {
    start: Value,
    end: Value,
}

impl BetweenValues {
    /// Create a range, failing if either bound is null.
    pub fn new(start: impl Into<Value>, end: impl Into<Value>) -> Result<Self, Error> {
        let start = start.into();
        let end = end.into();
        if start.is_null() || end.is_null() {
            return Err(Error::IncompleteRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Lower bound.
    pub fn start(&self) -> &Value {
        &self.start
    }

    /// Upper bound.
    pub fn end(&self) -> &Value {
        &self.end
    }
}

impl fmt::Display for BetweenValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AND {}", self.start, self.end)
    }
}

#[derive(Serialize, Deserialize)]
struct RangeRepr {
    start: Value,
    end: Value,
}

impl TryFrom<RangeRepr> for BetweenValues {
    type Error = Error;

    fn try_from(repr: RangeRepr) -> Result<Self, Self::Error> {
        BetweenValues::new(repr.start, repr.end)
    }
}

impl From<BetweenValues> for RangeRepr {
    fn from(range: BetweenValues) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// Operand of a leaf filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    /// A single value.
    Scalar(Value),
    /// A list of values (IN / NOT IN).
    List(Vec<Value>),
    /// A range (BETWEEN).
    Range(BetweenValues),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Scalar(v) => write!(f, "{v}"),
            FilterValue::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            FilterValue::Range(range) => write!(f, "{range}"),
        }
    }
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        FilterValue::Scalar(v)
    }
}

macro_rules! scalar_operand {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(v: $ty) -> Self {
                    FilterValue::Scalar(v.into())
                }
            }
        )*
    };
}

scalar_operand!(bool, i32, i64, f32, f64, String, &str);

impl From<Vec<Value>> for FilterValue {
    fn from(values: Vec<Value>) -> Self {
        FilterValue::List(values)
    }
}

impl From<BetweenValues> for FilterValue {
    fn from(range: BetweenValues) -> Self {
        FilterValue::Range(range)
    }
}

/// Boolean combinator of a compound filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompoundOperator {
    /// All children must match.
    And,
    /// At least one child must match.
    Or,
}

impl fmt::Display for CompoundOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompoundOperator::And => f.write_str("AND"),
            CompoundOperator::Or => f.write_str("OR"),
        }
    }
}

/// A single `path OPERATOR value` comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterLeaf {
    /// Dotted attribute path, possibly starting with an alias.
    pub path: String,
    /// Operator name, matched case-insensitively against the registry.
    pub operator: String,
    /// Operand.
    pub value: FilterValue,
}

/// A non-empty boolean combination of child expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CompoundRepr", into = "CompoundRepr")]
pub struct CompoundFilter {
    operator: CompoundOperator,
    filters: Vec<FilterExpr>,
}

impl CompoundFilter {
    /// Create a compound filter, failing when `filters` is empty.
    pub fn new(operator: CompoundOperator, filters: Vec<FilterExpr>) -> Result<Self, Error> {
        if filters.is_empty() {
            return Err(Error::EmptyCompound {
                operator: operator.to_string(),
            });
        }
        Ok(Self { operator, filters })
    }

    /// The boolean combinator.
    pub fn operator(&self) -> CompoundOperator {
        self.operator
    }

    /// Child expressions in declaration order.
    pub fn filters(&self) -> &[FilterExpr] {
        &self.filters
    }
}

#[derive(Serialize, Deserialize)]
struct CompoundRepr {
    operator: CompoundOperator,
    filters: Vec<FilterExpr>,
}

impl TryFrom<CompoundRepr> for CompoundFilter {
    type Error = Error;

    fn try_from(repr: CompoundRepr) -> Result<Self, Self::Error> {
        CompoundFilter::new(repr.operator, repr.filters)
    }
}

impl From<CompoundFilter> for CompoundRepr {
    fn from(compound: CompoundFilter) -> Self {
        Self {
            operator: compound.operator,
            filters: compound.filters,
        }
    }
}

/// Filter expression: a leaf comparison or a compound of expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Single comparison.
    Leaf(FilterLeaf),
    /// Boolean combination.
    Compound(CompoundFilter),
}

impl FilterExpr {
    /// Create a leaf filter with an operator given by name.
    pub fn leaf(
        path: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        FilterExpr::Leaf(FilterLeaf {
            path: path.into(),
            operator: operator.into(),
            value: value.into(),
        })
    }

    /// Create a compound filter.
    pub fn compound(operator: CompoundOperator, filters: Vec<FilterExpr>) -> Result<Self, Error> {
        CompoundFilter::new(operator, filters).map(FilterExpr::Compound)
    }

    /// Collect every path referenced by this expression, depth first.
    pub fn paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpr::Leaf(leaf) => out.push(&leaf.path),
            FilterExpr::Compound(compound) => {
                for child in &compound.filters {
                    child.collect_paths(out);
                }
            }
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Leaf(leaf) => write!(f, "{} {} {}", leaf.path, leaf.operator, leaf.value),
            FilterExpr::Compound(compound) => {
                write!(f, "{} (", compound.operator)?;
                for (i, child) in compound.filters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<FilterLeaf> for FilterExpr {
    fn from(leaf: FilterLeaf) -> Self {
        FilterExpr::Leaf(leaf)
    }
}

impl From<CompoundFilter> for FilterExpr {
    fn from(compound: CompoundFilter) -> Self {
        FilterExpr::Compound(compound)
    }
}

/// Helpers for building filter expressions.
///
/// ```
/// use projql_proto::filters;
///
/// let expr = filters::and(vec![
///     filters::eq("status", "ACTIVE"),
///     filters::or(vec![filters::lt("age", 18), filters::gt("age", 65)]).unwrap(),
/// ])
/// .unwrap();
/// assert_eq!(
///     expr.to_string(),
///     "AND (status EQUAL ACTIVE, OR (age LESS_THAN 18, age GREATER_THAN 65))"
/// );
/// ```
pub mod filters {
    use super::*;

    /// Leaf filter with a standard operator.
    pub fn of(path: impl Into<String>, operator: FilterOperator, value: impl Into<FilterValue>) -> FilterExpr {
        FilterExpr::leaf(path, operator.name(), value)
    }

    /// Leaf filter with an operator given by name.
    pub fn named(
        path: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> FilterExpr {
        FilterExpr::leaf(path, operator, value)
    }

    /// Conjunction of expressions.
    pub fn and(filters: Vec<FilterExpr>) -> Result<FilterExpr, Error> {
        FilterExpr::compound(CompoundOperator::And, filters)
    }

    /// Disjunction of expressions.
    pub fn or(filters: Vec<FilterExpr>) -> Result<FilterExpr, Error> {
        FilterExpr::compound(CompoundOperator::Or, filters)
    }

    /// `path = value`
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> FilterExpr {
        of(path, FilterOperator::Equal, FilterValue::Scalar(value.into()))
    }

    /// `path <> value`
    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> FilterExpr {
        of(path, FilterOperator::NotEqual, FilterValue::Scalar(value.into()))
    }

    /// `path > value`
    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> FilterExpr {
        of(path, FilterOperator::GreaterThan, FilterValue::Scalar(value.into()))
    }

    /// `path >= value`
    pub fn ge(path: impl Into<String>, value: impl Into<Value>) -> FilterExpr {
        of(path, FilterOperator::GreaterThanOrEqual, FilterValue::Scalar(value.into()))
    }

    /// `path < value`
    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> FilterExpr {
        of(path, FilterOperator::LessThan, FilterValue::Scalar(value.into()))
    }

    /// `path <= value`
    pub fn le(path: impl Into<String>, value: impl Into<Value>) -> FilterExpr {
        of(path, FilterOperator::LessThanOrEqual, FilterValue::Scalar(value.into()))
    }

    /// `path LIKE pattern`
    pub fn like(path: impl Into<String>, pattern: impl Into<String>) -> FilterExpr {
        of(path, FilterOperator::Like, Value::String(pattern.into()))
    }

    /// `path IN (values...)`
    pub fn is_in<V: Into<Value>>(path: impl Into<String>, values: impl IntoIterator<Item = V>) -> FilterExpr {
        of(
            path,
            FilterOperator::In,
            FilterValue::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `path NOT IN (values...)`
    pub fn not_in<V: Into<Value>>(path: impl Into<String>, values: impl IntoIterator<Item = V>) -> FilterExpr {
        of(
            path,
            FilterOperator::NotIn,
            FilterValue::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `path BETWEEN start AND end`; fails when either bound is null.
    pub fn between(
        path: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Result<FilterExpr, Error> {
        Ok(of(path, FilterOperator::Between, BetweenValues::new(start, end)?))
    }
}
