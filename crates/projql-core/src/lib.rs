//! projql Core - Path resolution, predicates, selection planning and row mapping.
//!
//! This crate turns declarative projection queries into criteria queries,
//! executes them through a [`QueryBackend`] and maps the rows back into
//! typed results.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod processor;
pub mod query;
pub mod resolver;
pub mod row;
pub mod select;
pub mod shape;

pub use backend::{Fixture, MemoryBackend, QueryBackend};
pub use catalog::{
    AccessorDef, Cardinality, Catalog, EntityDef, FieldDef, FieldType, RelationDef, ScalarType,
    SchemaBundle,
};
pub use config::ProcessorConfig;
pub use criteria::{CriteriaQuery, Expr, Navigator, NodeId, Predicate};
pub use error::{Error, ErrorCategory, Result};
pub use filter::{FilterOperatorHandler, OperatorRegistry};
pub use mapper::{MappingError, ResultMapper};
pub use processor::ProjectionProcessor;
pub use query::{spec_fn, ProjectionPage, ProjectionQuery, Specification};
pub use resolver::{IdentifierResolver, PathContext, PathResolver};
pub use row::Row;
pub use select::{SelectOperatorHandler, SelectOperatorRegistry};
pub use shape::{
    Arguments, FromValue, JoinDeclaration, Materializer, Projection, SelectionField, Shape,
    ShapeCache, ShapeKind, ShapeMetadata, ValueError,
};

/// Re-export protocol types.
pub use projql_proto as proto;
