//! Entity definitions.

use super::field::FieldDef;
use serde::{Deserialize, Serialize};

/// An entity definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name (unique within schema).
    pub name: String,
    /// Name of the primary identity field.
    pub identity_field: String,
    /// Field definitions.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Accessor methods declared on the entity.
    #[serde(default)]
    pub accessors: Vec<AccessorDef>,
}

/// An accessor method declared on an entity type.
///
/// Accessors named `getX` or `isX` stand for the logical attribute `x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorDef {
    /// Method name.
    pub method: String,
    /// Whether the accessor is declared as an identifier.
    #[serde(default)]
    pub identifier: bool,
}

impl AccessorDef {
    /// Create an accessor declaration.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            identifier: false,
        }
    }

    /// Mark the accessor as an identifier.
    pub fn with_identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    /// Logical attribute name recovered from `getX`/`isX`.
    pub fn property_name(&self) -> Option<String> {
        let rest = self
            .method
            .strip_prefix("get")
            .or_else(|| self.method.strip_prefix("is"))?;
        let mut chars = rest.chars();
        let first = chars.next()?;
        if !first.is_uppercase() {
            return None;
        }
        // "getURL" keeps its capitalisation
        if chars.next().is_some_and(char::is_uppercase) {
            return Some(rest.to_string());
        }
        let mut name = first.to_lowercase().collect::<String>();
        name.push_str(&rest[first.len_utf8()..]);
        Some(name)
    }
}

impl EntityDef {
    /// Create a new entity definition.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            fields: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add an accessor declaration.
    pub fn with_accessor(mut self, accessor: AccessorDef) -> Self {
        self.accessors.push(accessor);
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get the identity field definition.
    pub fn get_identity_field(&self) -> Option<&FieldDef> {
        self.get_field(&self.identity_field)
    }

    /// Names declared as identifiers: the identity field, flagged fields and
    /// flagged accessors.
    pub fn identifier_names(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.identity_field.clone())
            .chain(
                self.fields
                    .iter()
                    .filter(|f| f.identifier)
                    .map(|f| f.name.clone()),
            )
            .chain(
                self.accessors
                    .iter()
                    .filter(|a| a.identifier)
                    .filter_map(AccessorDef::property_name),
            )
    }
}
