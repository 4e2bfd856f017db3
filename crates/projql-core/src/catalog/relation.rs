//! Relation definitions between entities.

use serde::{Deserialize, Serialize};

/// Cardinality of a relation, seen from its source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// One-to-one relation (unique foreign key).
    OneToOne,
    /// Many source rows reference one target row.
    ManyToOne,
    /// One source row is referenced by many target rows.
    OneToMany,
}

/// A navigable relation from one entity to another.
///
/// The relation `name` is the attribute used in paths (`order.customer`).
/// A source row is joined with every target row whose `to_field` equals the
/// source's `from_field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Navigation attribute name (unique per source entity).
    pub name: String,
    /// Source entity name.
    pub from_entity: String,
    /// Target entity name.
    pub to_entity: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Join column on the source entity.
    pub from_field: String,
    /// Join column on the target entity.
    pub to_field: String,
}

impl RelationDef {
    fn with_cardinality(
        cardinality: Cardinality,
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality,
            from_field: from_field.into(),
            to_field: to_field.into(),
        }
    }

    /// Create a one-to-one relation.
    pub fn one_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::with_cardinality(
            Cardinality::OneToOne,
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
        )
    }

    /// Create a many-to-one relation (foreign key on the source).
    pub fn many_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::with_cardinality(
            Cardinality::ManyToOne,
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
        )
    }

    /// Create a one-to-many relation (foreign key on the target).
    pub fn one_to_many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::with_cardinality(
            Cardinality::OneToMany,
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
        )
    }

    /// Check if at most one target row exists per source row.
    pub fn is_to_one(&self) -> bool {
        matches!(self.cardinality, Cardinality::OneToOne | Cardinality::ManyToOne)
    }

    /// Get the inverse relation (swapping from/to).
    pub fn inverse(&self, name: impl Into<String>) -> Self {
        let cardinality = match self.cardinality {
            Cardinality::OneToOne => Cardinality::OneToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            Cardinality::OneToMany => Cardinality::ManyToOne,
        };
        Self {
            name: name.into(),
            from_entity: self.to_entity.clone(),
            to_entity: self.from_entity.clone(),
            cardinality,
            from_field: self.to_field.clone(),
            to_field: self.from_field.clone(),
        }
    }
}
