//! Entity catalog.
//!
//! The catalog stores metadata about entities, their fields and the relations
//! that paths navigate through.

mod catalog;
mod entity;
mod field;
mod relation;
mod schema;
mod types;

pub use catalog::{Attribute, Catalog};
pub use entity::{AccessorDef, EntityDef};
pub use field::FieldDef;
pub use relation::{Cardinality, RelationDef};
pub use schema::SchemaBundle;
pub use types::{FieldType, ScalarType};
