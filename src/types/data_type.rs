//! Scalar data types supported by columns and indexes

use crate::storage::page_constants::STRING_CELL_SIZE;
use crate::types::value::Value;
use std::fmt;

/// The fixed scalar type of a column and its index keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit IEEE float
    Float32,
    /// 64-bit IEEE float
    Float64,
    /// Fixed 256-byte zero-padded string
    Str,
    /// Boolean, ordered false < true
    Bool,
}

impl DataType {
    /// The fixed on-disk width of one cell of this type
    pub const fn cell_size(self) -> usize {
        match self {
            DataType::Int32 => 4,
            DataType::Int64 => 8,
            DataType::Float32 => 4,
            DataType::Float64 => 8,
            DataType::Str => STRING_CELL_SIZE,
            DataType::Bool => 1,
        }
    }

    /// The on-disk tag stored in node pages and column metadata
    pub const fn tag(self) -> u32 {
        match self {
            DataType::Int32 => 0,
            DataType::Int64 => 1,
            DataType::Float32 => 2,
            DataType::Float64 => 3,
            DataType::Str => 4,
            DataType::Bool => 5,
        }
    }

    /// Decode an on-disk tag
    pub fn from_tag(tag: u32) -> Option<DataType> {
        match tag {
            0 => Some(DataType::Int32),
            1 => Some(DataType::Int64),
            2 => Some(DataType::Float32),
            3 => Some(DataType::Float64),
            4 => Some(DataType::Str),
            5 => Some(DataType::Bool),
            _ => None,
        }
    }

    /// The default value appended when a row omits a column of this type
    pub fn default_value(self) -> Value {
        match self {
            DataType::Int32 => Value::Int32(0),
            DataType::Int64 => Value::Int64(0),
            DataType::Float32 => Value::Float32(0.0),
            DataType::Float64 => Value::Float64(0.0),
            DataType::Str => Value::Str(String::new()),
            DataType::Bool => Value::Bool(false),
        }
    }

    /// Check whether cells of this type contribute to sum/avg scans
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
            DataType::Str => "Str",
            DataType::Bool => "Bool",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_sizes() {
        assert_eq!(DataType::Int32.cell_size(), 4);
        assert_eq!(DataType::Int64.cell_size(), 8);
        assert_eq!(DataType::Float32.cell_size(), 4);
        assert_eq!(DataType::Float64.cell_size(), 8);
        assert_eq!(DataType::Str.cell_size(), 256);
        assert_eq!(DataType::Bool.cell_size(), 1);
    }

    #[test]
    fn test_tag_round_trip() {
        for dtype in [
            DataType::Int32,
            DataType::Int64,
            DataType::Float32,
            DataType::Float64,
            DataType::Str,
            DataType::Bool,
        ] {
            assert_eq!(DataType::from_tag(dtype.tag()), Some(dtype));
        }
        assert_eq!(DataType::from_tag(6), None);
        assert_eq!(DataType::from_tag(u32::MAX), None);
    }

    #[test]
    fn test_defaults_match_types() {
        for dtype in [DataType::Int32, DataType::Str, DataType::Bool] {
            assert_eq!(dtype.default_value().data_type(), dtype);
        }
    }

    #[test]
    fn test_numeric_classification() {
        assert!(DataType::Int32.is_numeric());
        assert!(DataType::Float64.is_numeric());
        assert!(!DataType::Str.is_numeric());
        assert!(!DataType::Bool.is_numeric());
    }
}
