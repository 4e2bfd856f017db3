//! projql protocol types.
//!
//! This crate defines the backend-independent vocabulary of the projql
//! projection engine: runtime values, filter expressions, ordering, paging,
//! join kinds and selector kinds. All types derive `serde` traits so that
//! queries can be loaded from configuration files.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types for filter operands and result rows
//! - [`filter`] - Leaf and compound filter expressions
//! - [`query`] - Ordering, paging, join and selector types
//! - [`error`] - Construction errors

pub mod error;
pub mod filter;
pub mod query;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use filter::{
    filters, BetweenValues, CompoundFilter, CompoundOperator, FilterExpr, FilterLeaf,
    FilterOperator, FilterValue,
};
pub use query::{AggregateFunction, JoinKind, OrderDirection, OrderSpec, Pagination, SelectorKind};
pub use value::Value;
