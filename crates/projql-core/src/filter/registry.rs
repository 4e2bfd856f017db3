//! Operator registry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use projql_proto::FilterOperator;
use tracing::{debug, warn};

use super::handlers::{standard_handler, FilterOperatorHandler};
use crate::error::{Error, Result};

/// Maps case-insensitive operator names to predicate builders.
///
/// Registration is additive: a name can be registered once and never
/// replaced. Lookups and registrations may happen from any thread.
pub struct OperatorRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn FilterOperatorHandler>>>,
}

impl OperatorRegistry {
    /// Create a registry without operators.
    pub fn empty() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry holding the standard operators.
    pub fn standard() -> Self {
        let handlers = FilterOperator::ALL
            .iter()
            .map(|op| (op.name().to_string(), Arc::from(standard_handler(*op))))
            .collect();
        Self {
            handlers: RwLock::new(handlers),
        }
    }

    /// Register a handler under `name`.
    ///
    /// Fails with [`Error::DuplicateOperator`] if the upper-cased name is
    /// already taken; the existing handler is kept.
    pub fn register<H>(&self, name: &str, handler: H) -> Result<()>
    where
        H: FilterOperatorHandler + 'static,
    {
        let key = name.to_uppercase();
        let mut handlers = self.handlers.write();
        match handlers.entry(key) {
            Entry::Occupied(entry) => {
                warn!(operator = %entry.key(), "operator already registered");
                Err(Error::DuplicateOperator(entry.key().clone()))
            }
            Entry::Vacant(entry) => {
                debug!(operator = %entry.key(), "registered operator");
                entry.insert(Arc::new(handler));
                Ok(())
            }
        }
    }

    /// Look up the handler for `name`, ignoring case.
    pub fn get(&self, name: &str) -> Result<Arc<dyn FilterOperatorHandler>> {
        let key = name.to_uppercase();
        if let Some(handler) = self.handlers.read().get(&key) {
            return Ok(Arc::clone(handler));
        }
        Err(Error::UnknownOperator {
            name: name.to_string(),
            available: self.available_operators(),
        })
    }

    /// Check if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(&name.to_uppercase())
    }

    /// Registered operator names, sorted.
    pub fn available_operators(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("operators", &self.available_operators())
            .finish()
    }
}
