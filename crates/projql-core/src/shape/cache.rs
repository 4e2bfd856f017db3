//! Process-wide cache of extracted shapes.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::{Projection, Shape};
use crate::error::{Error, Result};

/// Caches the validated [`Shape`] of each [`Projection`] type.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ShapeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the shape of `T`, extracting and validating it on first use.
    pub fn get_or_extract<T: Projection>(&self) -> Result<Arc<Shape<T>>> {
        let entry = self
            .shapes
            .entry(TypeId::of::<T>())
            .or_try_insert_with(|| {
                let shape = T::shape();
                shape.metadata.validate()?;
                debug!(
                    shape = %shape.metadata.name,
                    fields = shape.metadata.fields.len(),
                    "extracted shape metadata"
                );
                Ok::<_, Error>(Arc::new(shape) as Arc<dyn Any + Send + Sync>)
            })?;
        let any = Arc::clone(entry.value());
        drop(entry);
        any.downcast::<Shape<T>>().map_err(|_| Error::MalformedShape {
            shape: std::any::type_name::<T>().to_string(),
            reason: "cached shape has a different type".to_string(),
        })
    }

    /// Number of cached shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if no shape has been extracted yet.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
