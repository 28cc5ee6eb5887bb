//! Column store: typed columns, their metadata page, and the
//! type-erased column API used by tables

pub mod meta;
pub mod store;

pub use meta::{ColumnMeta, COLUMN_META_MAGIC, COLUMN_META_SIZE};
pub use store::Column;

use crate::common::error::Result;
use crate::storage::buffer_pool::BufferPool;
use crate::storage::page_constants::RecordId;
use crate::types::{DataType, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Type-erased column operations
///
/// Tables hold their columns as `Box<dyn ColumnOps>`; the typed
/// [`Column<T>`] implementations convert tagged [`Value`]s at this
/// boundary and reject mismatched types.
pub trait ColumnOps {
    /// Append a value; the record id is the pre-append length
    ///
    /// # Errors
    ///
    /// Returns a type mismatch for a value of the wrong type, or an
    /// I/O or index error from the append.
    fn append(&mut self, value: Value) -> Result<RecordId>;

    /// Read the value at `record_id`
    ///
    /// # Errors
    ///
    /// Returns an invalid input error past the end of the column.
    fn get(&self, record_id: RecordId) -> Result<Value>;

    /// Record ids whose value equals `value`
    ///
    /// # Errors
    ///
    /// Returns a type mismatch for a value of the wrong type.
    fn find(&self, value: &Value) -> Result<Vec<RecordId>>;

    /// Record ids whose value lies in `[low, high]` inclusive
    ///
    /// # Errors
    ///
    /// Returns a type mismatch for bounds of the wrong type.
    fn find_range(&self, low: &Value, high: &Value) -> Result<Vec<RecordId>>;

    /// Sum of the column under numeric coercion; 0 for non-numeric types
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    fn sum(&self) -> Result<f64>;

    /// Mean of the column under numeric coercion; 0 when empty
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    fn avg(&self) -> Result<f64>;

    /// Number of records in the column
    fn size(&self) -> RecordId;

    /// The column's data type
    fn data_type(&self) -> DataType;

    /// The column's `table/column` path relative to the database root
    fn name(&self) -> &str;

    /// The column's position in its table's declaration order
    fn ordinal(&self) -> u32;
}

/// Open (or create) a column of a runtime-chosen data type
///
/// This is the single point where the tagged [`DataType`] dispatches to
/// a typed [`Column<T>`]; everything past here is specialized.
///
/// # Errors
///
/// Returns an error on I/O failure, corrupt metadata, or a type clash
/// with an existing column.
pub fn open_column(
    name: String,
    data_type: DataType,
    ordinal: u32,
    pool: Rc<RefCell<BufferPool>>,
) -> Result<Box<dyn ColumnOps>> {
    Ok(match data_type {
        DataType::Int32 => Box::new(Column::<i32>::open(name, pool, ordinal)?),
        DataType::Int64 => Box::new(Column::<i64>::open(name, pool, ordinal)?),
        DataType::Float32 => Box::new(Column::<f32>::open(name, pool, ordinal)?),
        DataType::Float64 => Box::new(Column::<f64>::open(name, pool, ordinal)?),
        DataType::Str => Box::new(Column::<String>::open(name, pool, ordinal)?),
        DataType::Bool => Box::new(Column::<bool>::open(name, pool, ordinal)?),
    })
}

/// Read a column's metadata page without opening the column
///
/// Returns `None` when the column has never been written.
///
/// # Errors
///
/// Returns an error on I/O failure or corrupt metadata.
pub fn read_column_meta(
    name: &str,
    pool: &Rc<RefCell<BufferPool>>,
) -> Result<Option<ColumnMeta>> {
    let index_file = format!("{name}.idx");
    let handle = pool.borrow_mut().fetch_page(&index_file, 0)?;
    let page = handle.borrow();
    ColumnMeta::read_from(&page, name)
}
