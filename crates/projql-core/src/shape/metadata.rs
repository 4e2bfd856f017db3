//! Declarative description of a target shape.

use std::collections::HashSet;

use projql_proto::{JoinKind, SelectorKind};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{Error, Result};

/// How a row is turned into an instance of the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Default-construct, then assign each field by name.
    Fields,
    /// Pass every field, in declaration order, to a fixed-arity constructor.
    Constructor,
}

/// One output field of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionField {
    /// Name of the output column and target field.
    pub output_name: String,
    /// Dotted source path, possibly starting with an alias.
    pub source_path: String,
    /// Transformation applied to the resolved path.
    #[serde(default)]
    pub selector: SelectorKind,
    /// Type name reported in constructor mismatch diagnostics.
    #[serde(default = "default_type_name")]
    pub type_name: String,
}

fn default_type_name() -> String {
    "Value".to_string()
}

impl SelectionField {
    /// Select `source_path` as `output_name`.
    pub fn new(output_name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
            source_path: source_path.into(),
            selector: SelectorKind::IDENTITY,
            type_name: default_type_name(),
        }
    }

    /// Select a field whose target type is `T`.
    pub fn typed<T: super::FromValue>(
        output_name: impl Into<String>,
        source_path: impl Into<String>,
    ) -> Self {
        Self::new(output_name, source_path).with_type_name(T::TYPE_NAME)
    }

    /// Apply a selector kind.
    pub fn with_selector(mut self, selector: SelectorKind) -> Self {
        self.selector = selector;
        self
    }

    /// Set the diagnostic type name.
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }
}

/// Join kind pinned to a path, optionally reachable through an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDeclaration {
    /// Dotted relation path the declaration applies to.
    pub path: String,
    /// Short name that may replace `path` as the first segment of other paths.
    #[serde(default)]
    pub alias: Option<String>,
    /// Join kind for `path` and, unless overridden, its descendants.
    #[serde(default)]
    pub kind: JoinKind,
}

impl JoinDeclaration {
    /// Pin a join kind to `path`.
    pub fn new(path: impl Into<String>, kind: JoinKind) -> Self {
        Self {
            path: path.into(),
            alias: None,
            kind,
        }
    }

    /// Declare `alias` for `path` with a join kind.
    pub fn aliased(alias: impl Into<String>, path: impl Into<String>, kind: JoinKind) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
            kind,
        }
    }
}

/// Reject aliases that shadow a declared path or are declared twice.
pub fn validate_declarations(joins: &[JoinDeclaration]) -> Result<()> {
    let paths: HashSet<&str> = joins.iter().map(|j| j.path.as_str()).collect();
    let mut aliases = HashSet::new();
    for alias in joins.iter().filter_map(|j| j.alias.as_deref()) {
        if paths.contains(alias) {
            return Err(Error::AmbiguousAlias {
                alias: alias.to_string(),
            });
        }
        if !aliases.insert(alias) {
            return Err(Error::DuplicateAlias {
                alias: alias.to_string(),
            });
        }
    }
    Ok(())
}

/// Everything the engine needs to know about a target shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeMetadata {
    /// Shape name used in diagnostics.
    pub name: String,
    /// Entity queried when the caller does not name one.
    pub entity: String,
    /// Materialization strategy.
    pub kind: ShapeKind,
    /// Output fields in declaration order.
    pub fields: Vec<SelectionField>,
    /// Join kinds and aliases.
    #[serde(default)]
    pub joins: Vec<JoinDeclaration>,
}

impl ShapeMetadata {
    /// Create metadata without fields.
    pub fn new(name: impl Into<String>, entity: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            kind,
            fields: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Append an output field.
    pub fn with_field(mut self, field: SelectionField) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a join declaration.
    pub fn with_join(mut self, join: JoinDeclaration) -> Self {
        self.joins.push(join);
        self
    }

    /// Check that the metadata is self-consistent.
    pub fn validate(&self) -> Result<()> {
        if self.entity.trim().is_empty() {
            return Err(self.malformed("no source entity declared"));
        }
        if self.fields.is_empty() {
            return Err(self.malformed("at least one field is required"));
        }
        let mut outputs = HashSet::new();
        for field in &self.fields {
            if field.output_name.trim().is_empty() {
                return Err(self.malformed("field without output name"));
            }
            if field.source_path.trim().is_empty() {
                return Err(self.malformed(format!(
                    "field '{}' has an empty source path",
                    field.output_name
                )));
            }
            if !outputs.insert(field.output_name.as_str()) {
                return Err(self.malformed(format!(
                    "output name '{}' declared twice",
                    field.output_name
                )));
            }
        }
        if let Some(join) = self.joins.iter().find(|j| j.path.trim().is_empty()) {
            return Err(self.malformed(format!(
                "join declaration {:?} has an empty path",
                join.alias
            )));
        }
        validate_declarations(&self.joins)
    }

    /// Validate and check that the source entity exists in `catalog`.
    pub fn validate_against(&self, catalog: &Catalog) -> Result<()> {
        self.validate()?;
        catalog.entity(&self.entity).map(|_| ())
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedShape {
            shape: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> ShapeMetadata {
        ShapeMetadata::new("OrderSummary", "Order", ShapeKind::Fields)
            .with_field(SelectionField::new("id", "id"))
            .with_field(SelectionField::new("customerName", "c.name"))
            .with_join(JoinDeclaration::aliased("c", "customer", JoinKind::Left))
    }

    #[test]
    fn test_valid_shape() {
        assert!(shape().validate().is_ok());
    }

    #[test]
    fn test_alias_equal_to_path_is_rejected() {
        let shape = shape().with_join(JoinDeclaration::aliased("customer", "items", JoinKind::Inner));
        let err = shape.validate().unwrap_err();
        assert!(matches!(err, Error::AmbiguousAlias { alias } if alias == "customer"));
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let shape = shape().with_join(JoinDeclaration::aliased("c", "items", JoinKind::Inner));
        assert!(matches!(
            shape.validate(),
            Err(Error::DuplicateAlias { alias }) if alias == "c"
        ));
    }

    #[test]
    fn test_malformed_shapes() {
        let empty = ShapeMetadata::new("Empty", "Order", ShapeKind::Fields);
        assert!(matches!(empty.validate(), Err(Error::MalformedShape { .. })));

        let no_entity = ShapeMetadata::new("NoEntity", " ", ShapeKind::Fields)
            .with_field(SelectionField::new("id", "id"));
        assert!(matches!(no_entity.validate(), Err(Error::MalformedShape { .. })));

        let blank_path = ShapeMetadata::new("Blank", "Order", ShapeKind::Fields)
            .with_field(SelectionField::new("id", ""));
        assert!(matches!(blank_path.validate(), Err(Error::MalformedShape { .. })));

        let twice = ShapeMetadata::new("Twice", "Order", ShapeKind::Fields)
            .with_field(SelectionField::new("id", "id"))
            .with_field(SelectionField::new("id", "customer.id"));
        assert!(matches!(twice.validate(), Err(Error::MalformedShape { .. })));
    }

    #[test]
    fn test_selection_field_from_json() {
        let field: SelectionField =
            serde_json::from_str(r#"{"output_name":"total","source_path":"amount","selector":"SUM"}"#)
                .unwrap();
        assert_eq!(field.selector, SelectorKind::SUM);
        assert_eq!(field.type_name, "Value");
    }
}
