//! Path and identifier resolution.

mod context;
mod identifier;
mod path;

pub use context::PathContext;
pub use identifier::{IdentifierResolver, CONVENTIONAL_ID};
pub use path::PathResolver;
