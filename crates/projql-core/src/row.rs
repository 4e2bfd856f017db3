//! Result rows.

use projql_proto::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::shape::{Materializer, Shape, ShapeMetadata, ValueError};

/// An ordered list of named values produced by a backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.push((name.into(), value.into()));
    }

    /// Builder form of [`Row::push`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Get the first value named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove and return the first value named `name`.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.values.iter().position(|(n, _)| n == name)?;
        Some(self.values.remove(index).1)
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    /// Values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().map(|(_, v)| v)
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A field-assign shape that collects every selected column into a row.
    ///
    /// Used when the output structure is only known at runtime.
    pub fn shape(metadata: ShapeMetadata) -> Shape<Row> {
        Shape::new(
            metadata,
            Materializer::Fields {
                create: Row::new,
                assign: assign_column,
            },
        )
    }
}

fn assign_column(row: &mut Row, name: &str, value: Value) -> Result<(), ValueError> {
    row.push(name, value);
    Ok(())
}

impl From<Vec<(String, Value)>> for Row {
    fn from(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Serialized as a map preserving column order.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
