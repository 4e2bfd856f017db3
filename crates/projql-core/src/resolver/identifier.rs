//! Identifier detection for entity attributes.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::catalog::EntityDef;

/// Attribute name treated as an identifier on every entity.
pub const CONVENTIONAL_ID: &str = "id";

/// Decides whether an attribute is an identifier of its entity.
///
/// The identifier set of each entity is computed on first use and cached for
/// the lifetime of the resolver. Safe to share between threads.
#[derive(Debug, Default)]
pub struct IdentifierResolver {
    cache: DashMap<String, Arc<HashSet<String>>>,
}

impl IdentifierResolver {
    /// Create a resolver with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `attribute` identifies instances of `entity`.
    pub fn is_identifier(&self, entity: &EntityDef, attribute: &str) -> bool {
        attribute == CONVENTIONAL_ID || self.identifiers(entity).contains(attribute)
    }

    /// Identifier names declared by `entity`.
    pub fn identifiers(&self, entity: &EntityDef) -> Arc<HashSet<String>> {
        if let Some(cached) = self.cache.get(&entity.name) {
            return Arc::clone(cached.value());
        }
        let entry = self.cache.entry(entity.name.clone()).or_insert_with(|| {
            let names: HashSet<String> = entity.identifier_names().collect();
            trace!(entity = %entity.name, ?names, "collected identifier attributes");
            Arc::new(names)
        });
        Arc::clone(entry.value())
    }

    /// Number of entities with a cached identifier set.
    pub fn cached_entities(&self) -> usize {
        self.cache.len()
    }
}
