//! Fluent projection query builder.

use std::fmt;
use std::sync::Arc;

use projql_proto::{FilterExpr, FilterValue, OrderDirection, OrderSpec, Pagination};

use super::specification::Specification;
use crate::error::Result;
use crate::shape::{Projection, Shape, ShapeCache};

pub(crate) enum ShapeSource<T> {
    /// Extracted through the processor's shape cache.
    Cached(fn(&ShapeCache) -> Result<Arc<Shape<T>>>),
    /// Supplied by the caller.
    Explicit(Arc<Shape<T>>),
}

impl<T> ShapeSource<T> {
    pub(crate) fn load(&self, cache: &ShapeCache) -> Result<Arc<Shape<T>>> {
        match self {
            ShapeSource::Cached(extract) => extract(cache),
            ShapeSource::Explicit(shape) => Ok(Arc::clone(shape)),
        }
    }
}

/// Declarative query returning instances of `T`.
///
/// Filters and specifications are combined with AND; orders apply in the
/// sequence they were added.
pub struct ProjectionQuery<T> {
    pub(crate) shape: ShapeSource<T>,
    pub(crate) entity: Option<String>,
    pub(crate) filters: Vec<FilterExpr>,
    pub(crate) specifications: Vec<Box<dyn Specification>>,
    pub(crate) orders: Vec<OrderSpec>,
    pub(crate) pagination: Option<Pagination>,
    pub(crate) distinct: bool,
}

impl<T: Projection> ProjectionQuery<T> {
    /// Query the source entity declared by `T`'s shape.
    pub fn new() -> Self {
        Self::from_source(ShapeSource::Cached(ShapeCache::get_or_extract::<T>))
    }

    /// Query `entity` instead of the shape's declared source entity.
    pub fn for_entity(entity: impl Into<String>) -> Self {
        let mut query = Self::new();
        query.entity = Some(entity.into());
        query
    }
}

impl<T: Projection> Default for ProjectionQuery<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ProjectionQuery<T> {
    /// Query with a shape built at runtime.
    pub fn with_shape(shape: Shape<T>) -> Self {
        Self::from_source(ShapeSource::Explicit(Arc::new(shape)))
    }

    fn from_source(shape: ShapeSource<T>) -> Self {
        Self {
            shape,
            entity: None,
            filters: Vec::new(),
            specifications: Vec::new(),
            orders: Vec::new(),
            pagination: None,
            distinct: false,
        }
    }

    /// Add a `path OPERATOR value` filter.
    pub fn filter(
        mut self,
        path: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.filters.push(FilterExpr::leaf(path, operator, value));
        self
    }

    /// Add a filter expression.
    pub fn filter_expr(mut self, expr: FilterExpr) -> Self {
        self.filters.push(expr);
        self
    }

    /// Add a specification.
    pub fn specification(mut self, spec: impl Specification + 'static) -> Self {
        self.specifications.push(Box::new(spec));
        self
    }

    /// Order by `path`.
    pub fn order(mut self, path: impl Into<String>, direction: OrderDirection) -> Self {
        self.orders.push(OrderSpec::new(path, direction));
        self
    }

    /// Add an ordering specification.
    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.orders.push(order);
        self
    }

    /// Skip `first` rows and return at most `size`.
    pub fn paging(self, first: u32, size: u32) -> Self {
        self.pagination(Pagination::new(first, size))
    }

    /// Set pagination.
    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Remove duplicate rows.
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Filter expressions added so far.
    pub fn filters(&self) -> &[FilterExpr] {
        &self.filters
    }

    /// Orders added so far.
    pub fn orders(&self) -> &[OrderSpec] {
        &self.orders
    }

    /// Requested pagination.
    pub fn get_pagination(&self) -> Option<Pagination> {
        self.pagination
    }
}

impl<T> fmt::Debug for ProjectionQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionQuery")
            .field("entity", &self.entity)
            .field("filters", &self.filters)
            .field("specifications", &self.specifications.len())
            .field("orders", &self.orders)
            .field("pagination", &self.pagination)
            .field("distinct", &self.distinct)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use crate::shape::{SelectionField, ShapeKind, ShapeMetadata};
    use projql_proto::{filters, FilterOperator};

    #[test]
    fn test_builder_accumulates() {
        let metadata = ShapeMetadata::new("Names", "Customer", ShapeKind::Fields)
            .with_field(SelectionField::new("name", "name"));
        let query = ProjectionQuery::with_shape(Row::shape(metadata))
            .filter("age", FilterOperator::GreaterThan, 18)
            .filter_expr(filters::like("name", "A%"))
            .order("name", OrderDirection::Desc)
            .paging(20, 10)
            .distinct(true);

        assert_eq!(query.filters().len(), 2);
        assert_eq!(query.orders(), &[OrderSpec::desc("name")]);
        assert_eq!(query.get_pagination().map(|p| p.page_number()), Some(2));
        assert!(query.distinct);
    }
}
