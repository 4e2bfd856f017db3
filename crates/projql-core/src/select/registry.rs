//! Selector registry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use projql_proto::{AggregateFunction, SelectorKind};
use tracing::{debug, warn};

use super::handlers::{AbsHandler, AggregateHandler, IdentityHandler, SelectOperatorHandler};
use crate::error::{Error, Result};

/// Maps selector kinds to handlers. Registration is additive.
pub struct SelectOperatorRegistry {
    handlers: RwLock<HashMap<SelectorKind, Arc<dyn SelectOperatorHandler>>>,
}

impl SelectOperatorRegistry {
    /// Create a registry without selectors.
    pub fn empty() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with IDENTITY, the aggregates and ABS.
    pub fn standard() -> Self {
        let mut handlers: HashMap<SelectorKind, Arc<dyn SelectOperatorHandler>> = HashMap::new();
        handlers.insert(SelectorKind::IDENTITY, Arc::new(IdentityHandler));
        handlers.insert(SelectorKind::COUNT, Arc::new(AggregateHandler(AggregateFunction::Count)));
        handlers.insert(SelectorKind::SUM, Arc::new(AggregateHandler(AggregateFunction::Sum)));
        handlers.insert(SelectorKind::MIN, Arc::new(AggregateHandler(AggregateFunction::Min)));
        handlers.insert(SelectorKind::MAX, Arc::new(AggregateHandler(AggregateFunction::Max)));
        handlers.insert(SelectorKind::AVG, Arc::new(AggregateHandler(AggregateFunction::Avg)));
        handlers.insert(SelectorKind::ABS, Arc::new(AbsHandler));
        Self {
            handlers: RwLock::new(handlers),
        }
    }

    /// Register a handler for `kind`; an existing kind is never replaced.
    pub fn register<H>(&self, kind: SelectorKind, handler: H) -> Result<()>
    where
        H: SelectOperatorHandler + 'static,
    {
        let mut handlers = self.handlers.write();
        match handlers.entry(kind) {
            Entry::Occupied(entry) => {
                warn!(selector = %entry.key(), "selector already registered");
                Err(Error::DuplicateSelector(entry.key().to_string()))
            }
            Entry::Vacant(entry) => {
                debug!(selector = %entry.key(), "registered selector");
                entry.insert(Arc::new(handler));
                Ok(())
            }
        }
    }

    /// Look up the handler for `kind`.
    pub fn get(&self, kind: &SelectorKind) -> Result<Arc<dyn SelectOperatorHandler>> {
        if let Some(handler) = self.handlers.read().get(kind) {
            return Ok(Arc::clone(handler));
        }
        Err(Error::UnknownSelector {
            kind: kind.to_string(),
            available: self.available_kinds(),
        })
    }

    /// Registered kind names, sorted.
    pub fn available_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self
            .handlers
            .read()
            .keys()
            .map(|k| k.name().to_string())
            .collect();
        kinds.sort();
        kinds
    }
}

impl Default for SelectOperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for SelectOperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectOperatorRegistry")
            .field("kinds", &self.available_kinds())
            .finish()
    }
}
