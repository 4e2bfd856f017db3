//! Core type definitions for the catalog.

use serde::{Deserialize, Serialize};

/// Scalar data types an attribute can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
}

/// Field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create an optional scalar field type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        FieldType::OptionalScalar(scalar)
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::OptionalScalar(_))
    }

    /// Get the inner scalar type.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            FieldType::Scalar(s) | FieldType::OptionalScalar(s) => *s,
        }
    }
}
