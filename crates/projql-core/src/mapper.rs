//! Mapping of result rows into shape instances.

use projql_proto::Value;
use thiserror::Error;
use tracing::trace;

use crate::row::Row;
use crate::shape::{Materializer, Shape, ValueError};

/// A row could not be materialized into its shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Assigning a named field failed.
    #[error("failed to assign field '{field}' of {shape}")]
    Assign {
        shape: String,
        field: String,
        #[source]
        source: ValueError,
    },

    /// The constructor rejected the row's values.
    #[error(
        "constructor of {shape} does not accept the query result\n\
         Expected constructor types: [{}]\n\
         Query result types: [{}]",
        .expected.join(", "),
        .actual.join(", ")
    )]
    ConstructorMismatch {
        shape: String,
        expected: Vec<String>,
        actual: Vec<String>,
        #[source]
        source: ValueError,
    },
}

/// Turns rows into instances of a shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMapper;

impl ResultMapper {
    /// Map one row.
    ///
    /// A field-assign shape requires every declared column; a constructor
    /// shape reads missing columns as null and lets the constructor decide.
    pub fn map<T>(shape: &Shape<T>, mut row: Row) -> Result<T, MappingError> {
        let metadata = &shape.metadata;
        trace!(shape = %metadata.name, columns = row.len(), "mapping row");

        match &shape.materializer {
            Materializer::Fields { create, assign } => {
                let mut instance = create();
                for field in &metadata.fields {
                    let assign_error = |source: ValueError| MappingError::Assign {
                        shape: metadata.name.clone(),
                        field: field.output_name.clone(),
                        source,
                    };
                    let value = row.take(&field.output_name).ok_or_else(|| {
                        assign_error(ValueError::MissingColumn(field.output_name.clone()))
                    })?;
                    assign(&mut instance, &field.output_name, value).map_err(assign_error)?;
                }
                Ok(instance)
            }
            Materializer::Constructor { construct } => {
                let values: Vec<Value> = metadata
                    .fields
                    .iter()
                    .map(|field| row.take(&field.output_name).unwrap_or(Value::Null))
                    .collect();
                let actual: Vec<String> =
                    values.iter().map(|v| v.type_name().to_string()).collect();
                construct(values).map_err(|source| MappingError::ConstructorMismatch {
                    shape: metadata.name.clone(),
                    expected: metadata.fields.iter().map(|f| f.type_name.clone()).collect(),
                    actual,
                    source,
                })
            }
        }
    }

    /// Map every row, stopping at the first failure.
    pub fn map_all<T>(shape: &Shape<T>, rows: Vec<Row>) -> Result<Vec<T>, MappingError> {
        rows.into_iter().map(|row| Self::map(shape, row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Arguments, SelectionField, ShapeKind, ShapeMetadata};

    #[derive(Debug, PartialEq)]
    struct CustomerRef {
        id: i64,
        name: String,
    }

    fn constructor_shape() -> Shape<CustomerRef> {
        let metadata = ShapeMetadata::new("CustomerRef", "Customer", ShapeKind::Constructor)
            .with_field(SelectionField::typed::<i64>("id", "id"))
            .with_field(SelectionField::typed::<String>("name", "name"));
        Shape::new(
            metadata,
            Materializer::Constructor {
                construct: |values| {
                    let mut args = Arguments::new(values, 2)?;
                    Ok(CustomerRef {
                        id: args.next()?,
                        name: args.next()?,
                    })
                },
            },
        )
    }

    #[derive(Debug, Default, PartialEq)]
    struct Stats {
        age: Option<i32>,
        count: i64,
    }

    fn assign_stats(stats: &mut Stats, name: &str, value: Value) -> Result<(), ValueError> {
        use crate::shape::FromValue;
        match name {
            "age" => stats.age = FromValue::from_value(value)?,
            "count" => stats.count = FromValue::from_value(value)?,
            other => return Err(ValueError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn fields_shape() -> Shape<Stats> {
        let metadata = ShapeMetadata::new("Stats", "Customer", ShapeKind::Fields)
            .with_field(SelectionField::new("age", "age"))
            .with_field(SelectionField::new("count", "id"));
        Shape::new(
            metadata,
            Materializer::Fields {
                create: Stats::default,
                assign: assign_stats,
            },
        )
    }

    #[test]
    fn test_constructor_round_trip() {
        let row = Row::new().with("name", "Ann").with("id", 7i64);
        let mapped = ResultMapper::map(&constructor_shape(), row).unwrap();
        assert_eq!(
            mapped,
            CustomerRef {
                id: 7,
                name: "Ann".into()
            }
        );
    }

    #[test]
    fn test_constructor_mismatch_lists_types() {
        let row = Row::new().with("id", 7i64).with("name", 8i64);
        let err = ResultMapper::map(&constructor_shape(), row).unwrap_err();
        match &err {
            MappingError::ConstructorMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, &["i64", "String"]);
                assert_eq!(actual, &["i64", "i64"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("Expected constructor types: [i64, String]"));
        assert!(message.contains("Query result types: [i64, i64]"));
    }

    #[test]
    fn test_missing_column_is_null() {
        let row = Row::new().with("id", 7i64);
        let err = ResultMapper::map(&constructor_shape(), row).unwrap_err();
        assert!(matches!(
            err,
            MappingError::ConstructorMismatch { ref actual, .. } if actual == &["i64", "null"]
        ));
    }

    #[test]
    fn test_fields_assignment() {
        let rows = vec![
            Row::new().with("count", 2i64).with("age", 10),
            Row::new().with("count", 1i64).with("age", Value::Null),
        ];
        let mapped = ResultMapper::map_all(&fields_shape(), rows).unwrap();
        assert_eq!(
            mapped,
            vec![
                Stats {
                    age: Some(10),
                    count: 2
                },
                Stats {
                    age: None,
                    count: 1
                }
            ]
        );
    }

    #[test]
    fn test_fields_assignment_failure_names_field() {
        let row = Row::new().with("age", "ten").with("count", 1i64);
        let err = ResultMapper::map(&fields_shape(), row).unwrap_err();
        assert!(matches!(err, MappingError::Assign { ref field, .. } if field == "age"));
    }

    #[test]
    fn test_fields_missing_column_fails() {
        let row = Row::new().with("other", 1i64).with("count", 1i64);
        let err = ResultMapper::map(&fields_shape(), row).unwrap_err();
        assert_eq!(
            err,
            MappingError::Assign {
                shape: "Stats".into(),
                field: "age".into(),
                source: ValueError::MissingColumn("age".into()),
            }
        );
    }
}
