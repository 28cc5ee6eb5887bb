//! Per-column metadata page
//!
//! Page 0 of each index file holds a small typed header: node ids start
//! at 1, so the slot is free. The metadata carries everything a reopen
//! needs — the column type, its position in the table, the record
//! count, the index root, and the node-id high-water mark — guarded by
//! a CRC32 checksum.

use crate::common::error::{Error, Result};
use crate::storage::page::Page;
use crate::storage::page_constants::{PageId, RecordId, INVALID_PAGE_ID};
use crate::types::DataType;
use bytemuck::{bytes_of, pod_read_unaligned, Pod, Zeroable};

/// Magic marker at the start of every column metadata page ("STCL")
pub const COLUMN_META_MAGIC: u32 = 0x4C43_5453;

/// Serialized size of the metadata header
pub const COLUMN_META_SIZE: usize = 48;

/// Column metadata - exactly 48 bytes at the start of index page 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ColumnMeta {
    /// Magic marker, always [`COLUMN_META_MAGIC`] (4 bytes)
    pub magic: u32,
    /// On-disk tag of the column's [`DataType`] (4 bytes)
    pub data_type: u32,
    /// Position of the column in its table's declaration order (4 bytes)
    pub ordinal: u32,
    /// Reserved, written as zero (4 bytes)
    pub reserved0: u32,
    /// Number of records appended to the column (8 bytes)
    pub total_records: RecordId,
    /// Root node of the column's index, 0 while empty (8 bytes)
    pub root_page_id: PageId,
    /// Next node id the index will allocate (8 bytes)
    pub next_page_id: PageId,
    /// CRC32 of the first 40 header bytes (4 bytes)
    pub checksum: u32,
    /// Reserved, written as zero (4 bytes)
    pub reserved1: u32,
    // Total: 48 bytes
}

// SAFETY: ColumnMeta is a POD type: every field is plain data, the
// repr(C) layout has no padding (four u32, three u64 at 8-byte offsets,
// two trailing u32), and any bit pattern is a valid value.
unsafe impl Pod for ColumnMeta {}
unsafe impl Zeroable for ColumnMeta {}

impl ColumnMeta {
    /// Metadata for a freshly created column
    pub fn new(data_type: DataType, ordinal: u32) -> Self {
        Self {
            magic: COLUMN_META_MAGIC,
            data_type: data_type.tag(),
            ordinal,
            reserved0: 0,
            total_records: 0,
            root_page_id: INVALID_PAGE_ID,
            next_page_id: 1,
            checksum: 0,
            reserved1: 0,
        }
    }

    /// CRC32 over the header bytes before the checksum field
    fn compute_checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&bytes_of(self)[..40]);
        hasher.finalize()
    }

    /// Serialize this metadata into a page and mark the page dirty
    ///
    /// The stored checksum is recomputed on every write.
    pub fn write_to(&self, page: &mut Page) {
        let mut stamped = *self;
        stamped.reserved0 = 0;
        stamped.reserved1 = 0;
        stamped.checksum = stamped.compute_checksum();

        page.bytes_mut()[..COLUMN_META_SIZE].copy_from_slice(bytes_of(&stamped));
        page.mark_dirty();
    }

    /// Deserialize column metadata from index page 0
    ///
    /// Returns `None` for an all-zero page: the column has never been
    /// written.
    ///
    /// # Errors
    ///
    /// Returns a corruption error if the magic marker, checksum, or
    /// type tag is invalid.
    pub fn read_from(page: &Page, column_name: &str) -> Result<Option<Self>> {
        if page.is_zeroed() {
            return Ok(None);
        }

        let meta: ColumnMeta = pod_read_unaligned(&page.bytes()[..COLUMN_META_SIZE]);
        if meta.magic != COLUMN_META_MAGIC {
            return Err(Error::corruption(format!(
                "column {column_name} has bad metadata magic {:#010x}",
                meta.magic
            )));
        }
        if meta.checksum != meta.compute_checksum() {
            return Err(Error::corruption(format!(
                "column {column_name} has a bad metadata checksum"
            )));
        }
        if DataType::from_tag(meta.data_type).is_none() {
            return Err(Error::corruption(format!(
                "column {column_name} has unknown type tag {}",
                meta.data_type
            )));
        }

        Ok(Some(meta))
    }

    /// The column's data type
    ///
    /// Valid after [`ColumnMeta::read_from`] or [`ColumnMeta::new`].
    pub fn data_type_decoded(&self) -> Option<DataType> {
        DataType::from_tag(self.data_type)
    }
}
