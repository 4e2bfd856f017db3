//! Field definitions for entities.

use super::types::{FieldType, ScalarType};
use serde::{Deserialize, Serialize};

/// A scalar attribute of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Whether the field is declared as an identifier of its entity.
    #[serde(default)]
    pub identifier: bool,
}

impl FieldDef {
    /// Create a new required field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            identifier: false,
        }
    }

    /// Create a required scalar field.
    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::Scalar(scalar))
    }

    /// Create an optional scalar field.
    pub fn optional_scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::OptionalScalar(scalar))
    }

    /// Mark the field as an identifier.
    pub fn with_identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    /// Check if the field accepts nulls.
    pub fn is_nullable(&self) -> bool {
        self.field_type.is_nullable()
    }
}
