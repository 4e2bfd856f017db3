//! In-memory catalog of entity metadata.

use super::{EntityDef, RelationDef, SchemaBundle};
use crate::error::{Error, Result};

/// What an attribute name refers to on an entity.
#[derive(Debug, Clone, Copy)]
pub enum Attribute<'a> {
    /// A scalar field.
    Field(&'a super::FieldDef),
    /// A navigable relation.
    Relation(&'a RelationDef),
}

/// Read-only view of the entity model used for query building.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schema: SchemaBundle,
}

impl Catalog {
    /// Create a catalog from a schema bundle.
    ///
    /// Relations must connect entities present in the bundle through existing
    /// fields.
    pub fn new(schema: SchemaBundle) -> Result<Self> {
        for relation in &schema.relations {
            let from = schema
                .get_entity(&relation.from_entity)
                .ok_or_else(|| Error::UnknownEntity(relation.from_entity.clone()))?;
            let to = schema
                .get_entity(&relation.to_entity)
                .ok_or_else(|| Error::UnknownEntity(relation.to_entity.clone()))?;
            if from.get_field(&relation.from_field).is_none() {
                return Err(Error::UnknownAttribute {
                    entity: from.name.clone(),
                    attribute: relation.from_field.clone(),
                });
            }
            if to.get_field(&relation.to_field).is_none() {
                return Err(Error::UnknownAttribute {
                    entity: to.name.clone(),
                    attribute: relation.to_field.clone(),
                });
            }
        }
        Ok(Self { schema })
    }

    /// Get the schema version.
    pub fn version(&self) -> u64 {
        self.schema.version
    }

    /// Get the underlying schema bundle.
    pub fn schema(&self) -> &SchemaBundle {
        &self.schema
    }

    /// Get an entity definition by name.
    pub fn entity(&self, name: &str) -> Result<&EntityDef> {
        self.schema
            .get_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Check if the entity exists.
    pub fn has_entity(&self, name: &str) -> bool {
        self.schema.get_entity(name).is_some()
    }

    /// Get a relation declared on `entity`.
    pub fn relation(&self, entity: &str, name: &str) -> Option<&RelationDef> {
        self.schema.get_relation(entity, name)
    }

    /// Resolve an attribute name on an entity. Fields shadow relations.
    pub fn attribute(&self, entity: &str, name: &str) -> Result<Attribute<'_>> {
        let def = self.entity(entity)?;
        if let Some(field) = def.get_field(name) {
            return Ok(Attribute::Field(field));
        }
        self.relation(entity, name)
            .map(Attribute::Relation)
            .ok_or_else(|| Error::UnknownAttribute {
                entity: entity.to_string(),
                attribute: name.to_string(),
            })
    }

    /// List all entity names.
    pub fn list_entities(&self) -> Vec<&str> {
        self.schema.entity_names()
    }
}
