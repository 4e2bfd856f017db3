//! Schema bundle - snapshot of the entity model.

use super::{EntityDef, RelationDef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A versioned snapshot of the entity model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaBundle {
    /// Schema version.
    #[serde(default)]
    pub version: u64,
    /// Entity definitions keyed by name.
    pub entities: BTreeMap<String, EntityDef>,
    /// Relation definitions.
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

impl SchemaBundle {
    /// Create an empty schema bundle.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entities: BTreeMap::new(),
            relations: Vec::new(),
        }
    }

    /// Add an entity to the schema.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Add a relation to the schema.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Get an entity by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Get the relation named `name` declared on `entity`.
    pub fn get_relation(&self, entity: &str, name: &str) -> Option<&RelationDef> {
        self.relations
            .iter()
            .find(|r| r.from_entity == entity && r.name == name)
    }

    /// Get all relations for an entity (as source).
    pub fn relations_from(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.from_entity == entity)
            .collect()
    }

    /// Get all relations to an entity (as target).
    pub fn relations_to(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.to_entity == entity)
            .collect()
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, ScalarType};

    fn sample_schema() -> SchemaBundle {
        let customer = EntityDef::new("Customer", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("name", ScalarType::String));

        let order = EntityDef::new("Order", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("customer_id", ScalarType::Int64));

        let customer_rel =
            RelationDef::many_to_one("customer", "Order", "customer_id", "Customer", "id");
        let orders_rel = customer_rel.inverse("orders");

        SchemaBundle::new(1)
            .with_entity(customer)
            .with_entity(order)
            .with_relation(customer_rel)
            .with_relation(orders_rel)
    }

    #[test]
    fn test_schema_bundle_builder() {
        let schema = sample_schema();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.entities.len(), 2);
        assert_eq!(schema.relations.len(), 2);
        assert_eq!(schema.entity_names(), vec!["Customer", "Order"]);
    }

    #[test]
    fn test_relation_lookup_is_scoped_to_source() {
        let schema = sample_schema();

        assert!(schema.get_relation("Order", "customer").is_some());
        assert!(schema.get_relation("Customer", "customer").is_none());
        assert_eq!(schema.relations_from("Customer").len(), 1);
        assert_eq!(schema.relations_to("Customer").len(), 1);
    }
}
