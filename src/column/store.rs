//! Typed column store - fixed-width cells packed into data pages

use crate::column::meta::ColumnMeta;
use crate::column::ColumnOps;
use crate::common::error::{Error, Result};
use crate::index::BPlusTree;
use crate::storage::buffer_pool::BufferPool;
use crate::storage::page_constants::{PageId, RecordId, PAGE_SIZE};
use crate::types::{CellType, DataType, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// A persistent ordered sequence of cells of one scalar type
///
/// Cells pack `PAGE_SIZE / CELL_SIZE` per page in the column's data
/// file; trailing page bytes are padding, never cells. Record ids are
/// dense and assigned by append order, so a record's location is always
/// `(record_id / records_per_page, record_id % records_per_page)`.
/// Every append also feeds the column's B+ tree index, and the column
/// metadata page is rewritten so the column survives a reopen.
pub struct Column<T: CellType> {
    name: String,
    data_file: String,
    index_file: String,
    pool: Rc<RefCell<BufferPool>>,
    index: BPlusTree<T>,
    total_records: RecordId,
    ordinal: u32,
}

impl<T: CellType> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("ordinal", &self.ordinal)
            .field("total_records", &self.total_records)
            .finish()
    }
}

impl<T: CellType> Column<T> {
    /// Cells per data page for this column's type
    pub const fn records_per_page() -> u64 {
        (PAGE_SIZE / T::CELL_SIZE) as u64
    }

    /// Open a column named `name` (a `table/column` path relative to
    /// the database root), creating it if its metadata page is blank
    ///
    /// `ordinal` is the column's declaration position and only applies
    /// to a freshly created column; an existing column keeps the
    /// ordinal it was created with.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, corrupt metadata, or when the
    /// column exists with a different data type.
    pub fn open(name: String, pool: Rc<RefCell<BufferPool>>, ordinal: u32) -> Result<Self> {
        let data_file = format!("{name}.data");
        let index_file = format!("{name}.idx");

        let stored = {
            let handle = pool.borrow_mut().fetch_page(&index_file, 0)?;
            let page = handle.borrow();
            ColumnMeta::read_from(&page, &name)?
        };

        let column = match stored {
            Some(meta) => {
                if meta.data_type != T::DATA_TYPE.tag() {
                    return Err(Error::type_mismatch(format!(
                        "column {name} is typed {}, not {}",
                        meta.data_type_decoded()
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| format!("tag {}", meta.data_type)),
                        T::DATA_TYPE
                    )));
                }
                let index = BPlusTree::new(
                    index_file.clone(),
                    Rc::clone(&pool),
                    meta.root_page_id,
                    meta.next_page_id,
                );
                Self {
                    name,
                    data_file,
                    index_file,
                    pool,
                    index,
                    total_records: meta.total_records,
                    ordinal: meta.ordinal,
                }
            }
            None => {
                let index = BPlusTree::new(
                    index_file.clone(),
                    Rc::clone(&pool),
                    crate::storage::page_constants::INVALID_PAGE_ID,
                    1,
                );
                let column = Self {
                    name,
                    data_file,
                    index_file,
                    pool,
                    index,
                    total_records: 0,
                    ordinal,
                };
                // Stamp the metadata page so the column exists on flush.
                column.save_meta()?;
                column
            }
        };

        Ok(column)
    }

    /// Append one cell; the record id is the pre-append length
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a failed index insertion; the
    /// column length is unchanged on error.
    pub fn append_cell(&mut self, cell: T) -> Result<RecordId> {
        let record_id = self.total_records;
        let page_id = record_id / Self::records_per_page();
        let slot = (record_id % Self::records_per_page()) as usize;

        {
            let handle = self.pool.borrow_mut().fetch_page(&self.data_file, page_id)?;
            let mut page = handle.borrow_mut();
            let offset = slot * T::CELL_SIZE;
            cell.encode(&mut page.bytes_mut()[offset..offset + T::CELL_SIZE]);
            page.mark_dirty();
        }

        self.index.insert(cell, record_id)?;
        self.total_records += 1;
        self.save_meta()?;
        Ok(record_id)
    }

    /// Decode the cell at `record_id`
    ///
    /// # Errors
    ///
    /// Returns an invalid input error when `record_id` is past the end
    /// of the column, or an I/O error from the page fetch.
    pub fn get_cell(&self, record_id: RecordId) -> Result<T> {
        if record_id >= self.total_records {
            return Err(Error::invalid_input(format!(
                "record {record_id} out of range for column {} of length {}",
                self.name, self.total_records
            )));
        }

        let page_id = record_id / Self::records_per_page();
        let slot = (record_id % Self::records_per_page()) as usize;

        let handle = self.pool.borrow_mut().fetch_page(&self.data_file, page_id)?;
        let page = handle.borrow();
        let offset = slot * T::CELL_SIZE;
        Ok(T::decode(&page.bytes()[offset..offset + T::CELL_SIZE]))
    }

    /// Equality lookup through the index
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn find_cells(&self, key: &T) -> Result<Vec<RecordId>> {
        self.index.search(key)
    }

    /// Inclusive range lookup through the index
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn find_cells_in_range(&self, low: &T, high: &T) -> Result<Vec<RecordId>> {
        self.index.range_search(low, high)
    }

    /// Sum of the column's cells under numeric coercion
    ///
    /// One sequential pass over the data pages, in page order, decoding
    /// one page's worth of cells at a time. Non-numeric columns sum
    /// to 0.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn sum_cells(&self) -> Result<f64> {
        let per_page = Self::records_per_page();
        let mut total = 0.0;

        let mut page_id: PageId = 0;
        while page_id * per_page < self.total_records {
            let handle = self.pool.borrow_mut().fetch_page(&self.data_file, page_id)?;
            let page = handle.borrow();

            let start = page_id * per_page;
            let in_page = (self.total_records - start).min(per_page) as usize;
            for slot in 0..in_page {
                let offset = slot * T::CELL_SIZE;
                total += T::decode(&page.bytes()[offset..offset + T::CELL_SIZE]).to_f64();
            }
            page_id += 1;
        }

        Ok(total)
    }

    /// Arithmetic mean of the column's cells; 0 when empty
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn avg_cells(&self) -> Result<f64> {
        if self.total_records == 0 {
            return Ok(0.0);
        }
        Ok(self.sum_cells()? / self.total_records as f64)
    }

    /// Number of records appended so far
    pub fn len(&self) -> RecordId {
        self.total_records
    }

    /// Check whether the column holds no records
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }

    /// Rewrite the metadata page from current column state
    fn save_meta(&self) -> Result<()> {
        let mut meta = ColumnMeta::new(T::DATA_TYPE, self.ordinal);
        meta.total_records = self.total_records;
        meta.root_page_id = self.index.root_page_id();
        meta.next_page_id = self.index.next_page_id();

        let handle = self.pool.borrow_mut().fetch_page(&self.index_file, 0)?;
        let mut page = handle.borrow_mut();
        meta.write_to(&mut page);
        Ok(())
    }
}

impl<T: CellType> ColumnOps for Column<T> {
    fn append(&mut self, value: Value) -> Result<RecordId> {
        self.append_cell(T::from_value(value)?)
    }

    fn get(&self, record_id: RecordId) -> Result<Value> {
        Ok(self.get_cell(record_id)?.into_value())
    }

    fn find(&self, value: &Value) -> Result<Vec<RecordId>> {
        let key = T::from_value(value.clone())?;
        self.find_cells(&key)
    }

    fn find_range(&self, low: &Value, high: &Value) -> Result<Vec<RecordId>> {
        let low = T::from_value(low.clone())?;
        let high = T::from_value(high.clone())?;
        self.find_cells_in_range(&low, &high)
    }

    fn sum(&self) -> Result<f64> {
        self.sum_cells()
    }

    fn avg(&self) -> Result<f64> {
        self.avg_cells()
    }

    fn size(&self) -> RecordId {
        self.len()
    }

    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn ordinal(&self) -> u32 {
        self.ordinal
    }
}
