//! Caller-facing query API.

mod builder;
mod page;
mod specification;

pub use builder::ProjectionQuery;
pub(crate) use builder::ShapeSource;
pub use page::ProjectionPage;
pub use specification::{spec_fn, FnSpecification, Specification};
