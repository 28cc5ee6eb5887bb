//! Tagged scalar values used at API boundaries

use crate::common::error::{Error, Result};
use crate::types::data_type::DataType;
use std::cmp::Ordering;
use std::fmt;

/// A tagged scalar value of one of the supported [`DataType`]s
///
/// Ordering is defined only between values of the same type; comparing
/// across types is a type mismatch, never a silent coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit IEEE float
    Float32(f32),
    /// 64-bit IEEE float
    Float64(f64),
    /// String, stored as a fixed 256-byte zero-padded cell
    Str(String),
    /// Boolean, ordered false < true
    Bool(bool),
}

impl Value {
    /// The data type this value carries
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Float32(_) => DataType::Float32,
            Value::Float64(_) => DataType::Float64,
            Value::Str(_) => DataType::Str,
            Value::Bool(_) => DataType::Bool,
        }
    }

    /// Compare two values of the same type
    ///
    /// Floats use total ordering, so the result is deterministic for
    /// every bit pattern.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch error if the types differ.
    pub fn cmp_same_type(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Ok(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Ok(a.cmp(b)),
            (Value::Float32(a), Value::Float32(b)) => Ok(a.total_cmp(b)),
            (Value::Float64(a), Value::Float64(b)) => Ok(a.total_cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (a, b) => Err(Error::type_mismatch(format!(
                "cannot compare {} with {}",
                a.data_type(),
                b.data_type()
            ))),
        }
    }

    /// Numeric coercion used by sum/avg scans
    ///
    /// Non-numeric values coerce to 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int32(v) => f64::from(*v),
            Value::Int64(v) => *v as f64,
            Value::Float32(v) => f64::from(*v),
            Value::Float64(v) => *v,
            Value::Str(_) | Value::Bool(_) => 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_type_ordering() {
        assert_eq!(
            Value::Int32(1).cmp_same_type(&Value::Int32(2)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Value::Str("b".into()).cmp_same_type(&Value::Str("a".into())).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            Value::Bool(false).cmp_same_type(&Value::Bool(true)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Value::Float64(1.5).cmp_same_type(&Value::Float64(1.5)).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_cross_type_comparison_is_rejected() {
        let err = Value::Int32(1)
            .cmp_same_type(&Value::Int64(1))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int32(21).as_f64(), 21.0);
        assert_eq!(Value::Int64(-3).as_f64(), -3.0);
        assert_eq!(Value::Float32(1.5).as_f64(), 1.5);
        assert_eq!(Value::Float64(2.5).as_f64(), 2.5);
        assert_eq!(Value::Str("12".into()).as_f64(), 0.0);
        assert_eq!(Value::Bool(true).as_f64(), 0.0);
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(7i32), Value::Int32(7));
        assert_eq!(Value::from("abc"), Value::Str("abc".to_string()));
        assert_eq!(Value::from(true), Value::Bool(true));
    }
}
