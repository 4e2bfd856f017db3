//! Projection query orchestration.
//!
//! The processor turns a [`ProjectionQuery`] into a [`CriteriaQuery`]:
//! selections are planned first, then specifications and filters are
//! compiled into one conjunctive predicate, then orders are resolved. All of
//! them share a single [`PathResolver`], so a relation walked by several
//! paths is joined once. The backend executes the criteria query and the
//! [`ResultMapper`] turns rows into shape instances.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::QueryBackend;
use crate::config::ProcessorConfig;
use crate::criteria::{CriteriaQuery, Order, Predicate};
use crate::error::Result;
use crate::filter::{self, OperatorRegistry};
use crate::mapper::ResultMapper;
use crate::query::{ProjectionPage, ProjectionQuery};
use crate::resolver::{IdentifierResolver, PathContext, PathResolver};
use crate::select::{self, SelectOperatorRegistry};
use crate::shape::{Projection, Shape, ShapeCache};

/// Builds and runs projection queries against a backend.
///
/// Registries and caches are shared through `Arc`, so several processors
/// (for instance one per backend) can use the same operators and shapes.
pub struct ProjectionProcessor<B> {
    backend: B,
    operators: Arc<OperatorRegistry>,
    selectors: Arc<SelectOperatorRegistry>,
    identifiers: Arc<IdentifierResolver>,
    shapes: Arc<ShapeCache>,
    config: ProcessorConfig,
}

impl<B: QueryBackend> ProjectionProcessor<B> {
    /// Create a processor with the standard registries and default config.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            operators: Arc::new(OperatorRegistry::standard()),
            selectors: Arc::new(SelectOperatorRegistry::standard()),
            identifiers: Arc::new(IdentifierResolver::new()),
            shapes: Arc::new(ShapeCache::new()),
            config: ProcessorConfig::default(),
        }
    }

    /// Use `config` for query building.
    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a filter operator registry.
    pub fn with_operators(mut self, operators: Arc<OperatorRegistry>) -> Self {
        self.operators = operators;
        self
    }

    /// Share a selector registry.
    pub fn with_selectors(mut self, selectors: Arc<SelectOperatorRegistry>) -> Self {
        self.selectors = selectors;
        self
    }

    /// Share an identifier resolver.
    pub fn with_identifier_resolver(mut self, identifiers: Arc<IdentifierResolver>) -> Self {
        self.identifiers = identifiers;
        self
    }

    /// Share a shape cache.
    pub fn with_shape_cache(mut self, shapes: Arc<ShapeCache>) -> Self {
        self.shapes = shapes;
        self
    }

    /// The backend queries run against.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Filter operators available to queries.
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Selector kinds available to shapes.
    pub fn selectors(&self) -> &SelectOperatorRegistry {
        &self.selectors
    }

    /// Shapes extracted so far.
    pub fn shapes(&self) -> &ShapeCache {
        &self.shapes
    }

    /// Active configuration.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Build the criteria query for `query` without executing it.
    pub fn prepare<T>(
        &self,
        query: &ProjectionQuery<T>,
    ) -> Result<(Arc<Shape<T>>, CriteriaQuery<'_>)> {
        let shape = query.shape.load(&self.shapes)?;
        let metadata = &shape.metadata;
        let catalog = self.backend.catalog();
        metadata.validate_against(catalog)?;

        let entity = query.entity.as_deref().unwrap_or(&metadata.entity);
        let mut criteria = CriteriaQuery::new(catalog, entity)?;
        let mut resolver = PathResolver::new(&metadata.joins, &self.config)?
            .with_identifier_resolver(Arc::clone(&self.identifiers));

        let (plan, mut predicates, orders) = {
            let mut ctx = PathContext::new(&mut criteria, &mut resolver);
            let plan = select::plan(&metadata.fields, &mut ctx, &self.selectors)?;

            let mut predicates = Vec::with_capacity(query.specifications.len() + query.filters.len());
            for spec in &query.specifications {
                predicates.push(spec.to_predicate(&mut ctx)?);
            }
            for expr in &query.filters {
                predicates.push(filter::compile(expr, &mut ctx, &self.operators)?);
            }

            let mut orders = Vec::with_capacity(query.orders.len());
            for order in &query.orders {
                orders.push(Order {
                    expr: ctx.path(&order.path)?,
                    direction: order.direction,
                });
            }
            (plan, predicates, orders)
        };

        criteria.selections = plan.selections;
        criteria.group_by = plan.group_by;
        criteria.predicate = match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And(predicates)),
        };
        criteria.orders = orders;
        criteria.distinct = query.distinct;
        criteria.pagination = query.pagination;

        debug!(
            shape = %metadata.name,
            entity,
            joins = criteria.join_count(),
            cached_joins = resolver.cached_joins(),
            group_by = criteria.group_by.len(),
            "assembled criteria query"
        );
        Ok((shape, criteria))
    }

    /// Run `query` and map every row into `T`.
    #[instrument(skip_all)]
    pub fn execute<T>(&self, query: &ProjectionQuery<T>) -> Result<Vec<T>> {
        let (shape, criteria) = self.prepare(query)?;
        let rows = self.backend.execute(&criteria)?;
        let results = ResultMapper::map_all(&shape, rows)?;
        debug!(shape = %shape.metadata.name, rows = results.len(), "mapped results");
        Ok(results)
    }

    /// Run `query` and return one page together with the unpaged total.
    #[instrument(skip_all)]
    pub fn execute_page<T>(&self, query: &ProjectionQuery<T>) -> Result<ProjectionPage<T>> {
        let (shape, criteria) = self.prepare(query)?;
        let total = self.backend.count(&criteria)?;
        let rows = self.backend.execute(&criteria)?;
        let content = ResultMapper::map_all(&shape, rows)?;
        Ok(ProjectionPage::of(content, total, criteria.pagination))
    }

    /// Run the shape of `T` against its own source entity, unfiltered.
    pub fn execute_shape<T: Projection>(&self) -> Result<Vec<T>> {
        self.execute(&ProjectionQuery::<T>::new())
    }
}

impl<B> std::fmt::Debug for ProjectionProcessor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionProcessor")
            .field("operators", &self.operators)
            .field("selectors", &self.selectors)
            .field("shapes", &self.shapes.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
