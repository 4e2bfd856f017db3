//! Caller-supplied predicate builders.

use crate::criteria::Predicate;
use crate::error::Result;
use crate::resolver::PathContext;

/// Builds a predicate against the query being assembled.
///
/// Paths resolved through the context share joins with the selections and
/// filters of the same query.
pub trait Specification: Send + Sync {
    /// Build the predicate.
    fn to_predicate(&self, ctx: &mut PathContext<'_, '_>) -> Result<Predicate>;
}

/// A [`Specification`] backed by a closure.
pub struct FnSpecification<F>(F);

impl<F> Specification for FnSpecification<F>
where
    F: Fn(&mut PathContext<'_, '_>) -> Result<Predicate> + Send + Sync,
{
    fn to_predicate(&self, ctx: &mut PathContext<'_, '_>) -> Result<Predicate> {
        (self.0)(ctx)
    }
}

/// Wrap a closure as a specification.
pub fn spec_fn<F>(f: F) -> FnSpecification<F>
where
    F: Fn(&mut PathContext<'_, '_>) -> Result<Predicate> + Send + Sync,
{
    FnSpecification(f)
}
