//! Ordering, paging, join and selector types used by projection queries.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Ordering specification over an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Dotted attribute path (aliases allowed).
    pub path: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: OrderDirection,
}

impl OrderSpec {
    /// Create an ordering specification.
    pub fn new(path: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }

    /// Create ascending order.
    pub fn asc(path: impl Into<String>) -> Self {
        Self::new(path, OrderDirection::Asc)
    }

    /// Create descending order.
    pub fn desc(path: impl Into<String>) -> Self {
        Self::new(path, OrderDirection::Desc)
    }
}

/// Offset based pagination: skip `first` rows and return at most `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Index of the first row to return.
    pub first: u32,
    /// Maximum number of rows to return.
    pub size: u32,
}

impl Pagination {
    /// Create pagination parameters.
    pub fn new(first: u32, size: u32) -> Self {
        Self { first, size }
    }

    /// Create pagination for a zero-based page number.
    pub fn page(page_number: u32, size: u32) -> Result<Self, Error> {
        page_number
            .checked_mul(size)
            .map(|first| Self { first, size })
            .ok_or_else(|| Error::InvalidPaging(format!("page {page_number} of size {size} overflows")))
    }

    /// Zero-based page number derived from the offset and size.
    pub fn page_number(&self) -> u32 {
        if self.size > 0 {
            self.first / self.size
        } else {
            0
        }
    }
}

/// Join semantics for a navigation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    /// Keep only rows that have a related entity.
    #[default]
    Inner,
    /// Keep rows without a related entity, with null attributes.
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => f.write_str("INNER"),
            JoinKind::Left => f.write_str("LEFT"),
        }
    }
}

/// Aggregate function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    /// Count of non-null values.
    Count,
    /// Sum of numeric values.
    Sum,
    /// Average of numeric values.
    Avg,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        };
        f.write_str(name)
    }
}

/// Identity of a selection transformation.
///
/// Selector kinds are compared by exact identity; the standard kinds are
/// provided as associated constants and custom kinds can be created with
/// [`SelectorKind::custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorKind(Cow<'static, str>);

impl SelectorKind {
    /// Select the attribute as is.
    pub const IDENTITY: SelectorKind = SelectorKind(Cow::Borrowed("IDENTITY"));
    /// `COUNT(path)`
    pub const COUNT: SelectorKind = SelectorKind(Cow::Borrowed("COUNT"));
    /// `SUM(path)`
    pub const SUM: SelectorKind = SelectorKind(Cow::Borrowed("SUM"));
    /// `MIN(path)`
    pub const MIN: SelectorKind = SelectorKind(Cow::Borrowed("MIN"));
    /// `MAX(path)`
    pub const MAX: SelectorKind = SelectorKind(Cow::Borrowed("MAX"));
    /// `AVG(path)`
    pub const AVG: SelectorKind = SelectorKind(Cow::Borrowed("AVG"));
    /// `ABS(path)`
    pub const ABS: SelectorKind = SelectorKind(Cow::Borrowed("ABS"));

    /// Create a custom selector kind.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        SelectorKind(name.into())
    }

    /// Name of this kind.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for SelectorKind {
    fn default() -> Self {
        SelectorKind::IDENTITY
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
