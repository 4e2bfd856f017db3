//! Conversions from row values into typed shape fields.

use projql_proto::Value;
use thiserror::Error;

/// Failure to bind a value to a shape field or constructor argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The value has a different type than the target.
    #[error("expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The constructor takes a different number of arguments.
    #[error("expected {expected} arguments, found {actual}")]
    Arity { expected: usize, actual: usize },

    /// The row has no column for a declared field.
    #[error("result row has no column '{0}'")]
    MissingColumn(String),

    /// The shape has no field with this name.
    #[error("no field named '{0}'")]
    UnknownField(String),
}

/// Types a row value can be converted into.
pub trait FromValue: Sized {
    /// Name reported in mismatch diagnostics.
    const TYPE_NAME: &'static str;

    /// Convert a row value.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

fn mismatch<T: FromValue>(value: &Value) -> ValueError {
    ValueError::TypeMismatch {
        expected: T::TYPE_NAME,
        actual: value.type_name(),
    }
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "Value";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        value.as_bool().ok_or_else(|| mismatch::<Self>(&value))
    }
}

impl FromValue for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        value.as_i32().ok_or_else(|| mismatch::<Self>(&value))
    }
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        value.as_i64().ok_or_else(|| mismatch::<Self>(&value))
    }
}

impl FromValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float32(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float64(v) => Ok(v),
            Value::Float32(v) => Ok(v as f64),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// `None` for null, otherwise the inner conversion.
impl<T: FromValue> FromValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Positional constructor arguments.
///
/// ```
/// use projql_core::shape::Arguments;
/// use projql_proto::Value;
///
/// let mut args = Arguments::new(vec![Value::Int64(7), Value::from("Ann")], 2).unwrap();
/// let id: i64 = args.next().unwrap();
/// let name: String = args.next().unwrap();
/// assert_eq!((id, name.as_str()), (7, "Ann"));
/// ```
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<Value>,
}

impl Arguments {
    /// Wrap `values`, failing unless exactly `arity` are present.
    pub fn new(values: Vec<Value>, arity: usize) -> Result<Self, ValueError> {
        if values.len() != arity {
            return Err(ValueError::Arity {
                expected: arity,
                actual: values.len(),
            });
        }
        Ok(Self {
            values: values.into_iter(),
        })
    }

    /// Convert the next argument.
    #[allow(clippy::should_implement_trait)]
    pub fn next<T: FromValue>(&mut self) -> Result<T, ValueError> {
        let value = self.values.next().unwrap_or(Value::Null);
        T::from_value(value)
    }
}
