//! Query execution backends.
//!
//! A backend owns the [`Catalog`] queries are validated against and executes
//! assembled [`CriteriaQuery`] values into rows keyed by selection alias.

mod fixture;
mod memory;

pub use fixture::Fixture;
pub use memory::{like_match, MemoryBackend};

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::criteria::CriteriaQuery;
use crate::error::Result;
use crate::row::Row;

/// Executes criteria queries.
pub trait QueryBackend: Send + Sync {
    /// Catalog used to build queries for this backend.
    fn catalog(&self) -> &Catalog;

    /// Run the query, returning one row per result with columns named by
    /// selection alias, in selection order.
    fn execute(&self, query: &CriteriaQuery<'_>) -> Result<Vec<Row>>;

    /// Count the rows the query returns without pagination.
    fn count(&self, query: &CriteriaQuery<'_>) -> Result<u64> {
        let mut unpaged = query.clone();
        unpaged.pagination = None;
        unpaged.orders.clear();
        Ok(self.execute(&unpaged)?.len() as u64)
    }
}

impl<B: QueryBackend + ?Sized> QueryBackend for Arc<B> {
    fn catalog(&self) -> &Catalog {
        (**self).catalog()
    }

    fn execute(&self, query: &CriteriaQuery<'_>) -> Result<Vec<Row>> {
        (**self).execute(query)
    }

    fn count(&self, query: &CriteriaQuery<'_>) -> Result<u64> {
        (**self).count(query)
    }
}

impl<B: QueryBackend + ?Sized> QueryBackend for &B {
    fn catalog(&self) -> &Catalog {
        (**self).catalog()
    }

    fn execute(&self, query: &CriteriaQuery<'_>) -> Result<Vec<Row>> {
        (**self).execute(query)
    }

    fn count(&self, query: &CriteriaQuery<'_>) -> Result<u64> {
        (**self).count(query)
    }
}
