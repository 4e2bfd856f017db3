//! Target shapes.
//!
//! A shape pairs [`ShapeMetadata`] (what to select and how to join) with a
//! [`Materializer`] that turns a result row into an instance. Types describe
//! themselves by implementing [`Projection`]; the metadata is extracted once
//! per type and kept in a [`ShapeCache`].

mod cache;
mod metadata;
mod value;

pub use cache::ShapeCache;
pub use metadata::{
    validate_declarations, JoinDeclaration, SelectionField, ShapeKind, ShapeMetadata,
};
pub use value::{Arguments, FromValue, ValueError};

use projql_proto::Value;

/// Builds instances of `T` from row values.
pub enum Materializer<T> {
    /// Create a default instance, then assign each output field by name.
    Fields {
        /// Create an empty instance.
        create: fn() -> T,
        /// Assign one named value.
        assign: fn(&mut T, &str, Value) -> Result<(), ValueError>,
    },
    /// Invoke a constructor with the output fields in declaration order.
    Constructor {
        /// Build an instance from positional values.
        construct: fn(Vec<Value>) -> Result<T, ValueError>,
    },
}

impl<T> Materializer<T> {
    /// Shape kind implemented by this materializer.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Materializer::Fields { .. } => ShapeKind::Fields,
            Materializer::Constructor { .. } => ShapeKind::Constructor,
        }
    }
}

impl<T> Clone for Materializer<T> {
    fn clone(&self) -> Self {
        match self {
            Materializer::Fields { create, assign } => Materializer::Fields {
                create: *create,
                assign: *assign,
            },
            Materializer::Constructor { construct } => Materializer::Constructor {
                construct: *construct,
            },
        }
    }
}

impl<T> std::fmt::Debug for Materializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Materializer::{:?}", self.kind())
    }
}

/// Metadata plus materialization strategy for `T`.
pub struct Shape<T> {
    /// Selection and join metadata.
    pub metadata: ShapeMetadata,
    /// Row materialization strategy.
    pub materializer: Materializer<T>,
}

impl<T> Shape<T> {
    /// Create a shape. The metadata kind follows the materializer.
    pub fn new(mut metadata: ShapeMetadata, materializer: Materializer<T>) -> Self {
        metadata.kind = materializer.kind();
        Self {
            metadata,
            materializer,
        }
    }
}

impl<T> std::fmt::Debug for Shape<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("metadata", &self.metadata)
            .field("materializer", &self.materializer)
            .finish()
    }
}

impl<T> Clone for Shape<T> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            materializer: self.materializer.clone(),
        }
    }
}

/// A type that can be the target of a projection query.
///
/// ```
/// use projql_core::shape::{Arguments, Materializer, Projection, SelectionField, Shape, ShapeKind, ShapeMetadata};
///
/// struct CustomerRef {
///     id: i64,
///     name: String,
/// }
///
/// impl Projection for CustomerRef {
///     fn shape() -> Shape<Self> {
///         let metadata = ShapeMetadata::new("CustomerRef", "Customer", ShapeKind::Constructor)
///             .with_field(SelectionField::typed::<i64>("id", "id"))
///             .with_field(SelectionField::typed::<String>("name", "name"));
///         Shape::new(
///             metadata,
///             Materializer::Constructor {
///                 construct: |values| {
///                     let mut args = Arguments::new(values, 2)?;
///                     Ok(CustomerRef { id: args.next()?, name: args.next()? })
///                 },
///             },
///         )
///     }
/// }
/// ```
pub trait Projection: Sized + 'static {
    /// Describe the shape of `Self`.
    fn shape() -> Shape<Self>;
}
