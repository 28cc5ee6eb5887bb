//! Fixed-width cell codec, specialized per scalar type
//!
//! Each supported scalar implements [`CellType`], so a column or index
//! parameterized by its key type encodes, decodes, and compares cells
//! without per-cell tag dispatch, and the cell width is a compile-time
//! constant. The only tagged dispatch left is the single `match` on
//! [`DataType`] when a column is constructed.

use crate::common::error::{Error, Result};
use crate::storage::page_constants::STRING_CELL_SIZE;
use crate::types::data_type::DataType;
use crate::types::value::Value;
use std::cmp::Ordering;

/// A scalar that can live in a fixed-width cell
///
/// `encode` and `decode` operate on a buffer of exactly
/// [`CellType::CELL_SIZE`] bytes, little-endian for numerics. `key_cmp`
/// is the total order used by the B+ tree; floats compare with
/// `total_cmp` so every bit pattern orders deterministically.
pub trait CellType: Clone + Sized {
    /// The tagged type this scalar corresponds to
    const DATA_TYPE: DataType;
    /// The fixed on-disk width of one cell
    const CELL_SIZE: usize;

    /// Encode this value into a cell buffer of `CELL_SIZE` bytes
    fn encode(&self, buf: &mut [u8]);

    /// Decode a value from a cell buffer of `CELL_SIZE` bytes
    fn decode(buf: &[u8]) -> Self;

    /// Total order between two keys of this type
    fn key_cmp(&self, other: &Self) -> Ordering;

    /// Numeric coercion used by sum/avg scans; non-numeric types yield 0
    fn to_f64(&self) -> f64;

    /// Extract a typed cell from a tagged value
    ///
    /// # Errors
    ///
    /// Returns a type mismatch error if the value carries another type.
    fn from_value(value: Value) -> Result<Self>;

    /// Wrap this cell back into a tagged value
    fn into_value(self) -> Value;
}

fn mismatch(expected: DataType, got: &Value) -> Error {
    Error::type_mismatch(format!("expected {expected}, got {}", got.data_type()))
}

impl CellType for i32 {
    const DATA_TYPE: DataType = DataType::Int32;
    const CELL_SIZE: usize = 4;

    fn encode(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Self {
        i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_f64(&self) -> f64 {
        f64::from(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int32(v) => Ok(v),
            other => Err(mismatch(Self::DATA_TYPE, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Int32(self)
    }
}

impl CellType for i64 {
    const DATA_TYPE: DataType = DataType::Int64;
    const CELL_SIZE: usize = 8;

    fn encode(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&buf[..8]);
        i64::from_le_bytes(raw)
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_f64(&self) -> f64 {
        *self as f64
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int64(v) => Ok(v),
            other => Err(mismatch(Self::DATA_TYPE, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Int64(self)
    }
}

impl CellType for f32 {
    const DATA_TYPE: DataType = DataType::Float32;
    const CELL_SIZE: usize = 4;

    fn encode(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Self {
        f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn to_f64(&self) -> f64 {
        f64::from(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float32(v) => Ok(v),
            other => Err(mismatch(Self::DATA_TYPE, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Float32(self)
    }
}

impl CellType for f64 {
    const DATA_TYPE: DataType = DataType::Float64;
    const CELL_SIZE: usize = 8;

    fn encode(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&buf[..8]);
        f64::from_le_bytes(raw)
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn to_f64(&self) -> f64 {
        *self
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(v) => Ok(v),
            other => Err(mismatch(Self::DATA_TYPE, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Float64(self)
    }
}

impl CellType for String {
    const DATA_TYPE: DataType = DataType::Str;
    const CELL_SIZE: usize = STRING_CELL_SIZE;

    fn encode(&self, buf: &mut [u8]) {
        // Content is capped at 255 bytes so the cell always ends in a NUL.
        let bytes = self.as_bytes();
        let len = bytes.len().min(STRING_CELL_SIZE - 1);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf[len..STRING_CELL_SIZE].fill(0);
    }

    fn decode(buf: &[u8]) -> Self {
        let cell = &buf[..STRING_CELL_SIZE];
        let end = cell.iter().position(|&b| b == 0).unwrap_or(cell.len());
        String::from_utf8_lossy(&cell[..end]).into_owned()
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_f64(&self) -> f64 {
        0.0
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(v) => Ok(v),
            other => Err(mismatch(Self::DATA_TYPE, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl CellType for bool {
    const DATA_TYPE: DataType = DataType::Bool;
    const CELL_SIZE: usize = 1;

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = u8::from(*self);
    }

    fn decode(buf: &[u8]) -> Self {
        buf[0] != 0
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_f64(&self) -> f64 {
        0.0
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch(Self::DATA_TYPE, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: CellType + PartialEq + std::fmt::Debug>(value: T) {
        let mut buf = vec![0u8; T::CELL_SIZE];
        value.encode(&mut buf);
        assert_eq!(T::decode(&buf), value);
    }

    #[test]
    fn test_numeric_round_trips() {
        round_trip(0i32);
        round_trip(-123_456i32);
        round_trip(i64::MAX);
        round_trip(1.5f32);
        round_trip(-2.25f64);
        round_trip(true);
        round_trip(false);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = [0u8; 4];
        0x0403_0201i32.encode(&mut buf);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_string_cell_is_zero_padded() {
        let mut buf = [0xFFu8; STRING_CELL_SIZE];
        "abc".to_string().encode(&mut buf);
        assert_eq!(&buf[..3], b"abc");
        assert!(buf[3..].iter().all(|&b| b == 0));
        assert_eq!(String::decode(&buf), "abc");
    }

    #[test]
    fn test_string_cell_truncates_at_255_bytes() {
        let long = "x".repeat(300);
        let mut buf = [0u8; STRING_CELL_SIZE];
        long.encode(&mut buf);
        assert_eq!(buf[255], 0);
        assert_eq!(String::decode(&buf).len(), 255);
    }

    #[test]
    fn test_empty_string_round_trips() {
        round_trip(String::new());
    }

    #[test]
    fn test_float_total_order() {
        assert_eq!((-0.0f64).key_cmp(&0.0f64), Ordering::Less);
        assert_eq!(1.0f64.key_cmp(&1.0f64), Ordering::Equal);
        assert_eq!(2.0f32.key_cmp(&1.0f32), Ordering::Greater);
    }

    #[test]
    fn test_value_conversion_checks_type() {
        assert_eq!(i32::from_value(Value::Int32(9)).unwrap(), 9);
        let err = i32::from_value(Value::Str("9".into())).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
        assert_eq!(42i32.into_value(), Value::Int32(42));
    }
}
