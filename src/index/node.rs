//! B+ tree node layout - one serialized node per index page
//!
//! On-disk layout, packed little-endian:
//!
//! ```text
//! offset 0   is_leaf    u8 (0 = internal, nonzero = leaf)
//! offset 1   data_type  u32 tag
//! offset 5   key_count  u64
//! offset 13  keys       key_count cells, encoded per data type
//! leaf:      records    key_count u64 record ids, then next_leaf u64
//! internal:  children   key_count + 1 u64 page ids
//! rest:      zero padding
//! ```
//!
//! An all-zero page is an uninitialized node and loads as an empty leaf.

use crate::common::error::{Error, Result};
use crate::storage::page::Page;
use crate::storage::page_constants::{PageId, RecordId, INVALID_PAGE_ID, PAGE_SIZE};
use crate::types::{CellType, DataType};
use crate::{strata_error, strata_warn};

/// Serialized size of the fixed node header
pub const NODE_HEADER_SIZE: usize = 13;

/// Largest key count for which a node of the given cell width still fits
/// in one page, capped by the tree order
///
/// Leaves carry `n` record ids plus the chain pointer, internal nodes
/// carry `n + 1` child ids; both need `n * (cell + 8) + 8` bytes past
/// the header. Wide key types (strings) get a smaller capacity than the
/// order would allow.
pub fn node_capacity(cell_size: usize, order: usize) -> usize {
    let fits = (PAGE_SIZE - NODE_HEADER_SIZE - 8) / (cell_size + 8);
    fits.min(order - 1)
}

/// In-memory B+ tree node, deserialized from one index page
///
/// Leaves hold parallel `keys`/`records` plus the `next_leaf` chain
/// pointer; internal nodes hold `keys` plus `|keys| + 1` `children`.
pub struct Node<T: CellType> {
    /// Leaf or internal
    pub is_leaf: bool,
    /// Sorted keys
    pub keys: Vec<T>,
    /// Record ids, parallel to `keys` (leaves only)
    pub records: Vec<RecordId>,
    /// Child page ids, `|keys| + 1` entries (internal nodes only)
    pub children: Vec<PageId>,
    /// Successor leaf in key order, or [`INVALID_PAGE_ID`] if last
    pub next_leaf: PageId,
}

impl<T: CellType> Node<T> {
    /// Create an empty leaf
    pub fn new_leaf() -> Self {
        Self {
            is_leaf: true,
            keys: Vec::new(),
            records: Vec::new(),
            children: Vec::new(),
            next_leaf: INVALID_PAGE_ID,
        }
    }

    /// Create an empty internal node
    pub fn new_internal() -> Self {
        Self {
            is_leaf: false,
            keys: Vec::new(),
            records: Vec::new(),
            children: Vec::new(),
            next_leaf: INVALID_PAGE_ID,
        }
    }

    /// Exact number of bytes this node serializes to
    pub fn serialized_size(&self) -> usize {
        let tail = if self.is_leaf {
            self.records.len() * 8 + 8
        } else {
            self.children.len() * 8
        };
        NODE_HEADER_SIZE + self.keys.len() * T::CELL_SIZE + tail
    }

    /// Serialize this node into a page and mark the page dirty
    ///
    /// # Errors
    ///
    /// Returns a page overflow error if the node does not fit in one
    /// page, or an internal error if its parallel vectors are
    /// inconsistent. The page is untouched on error, so the caller's
    /// prior on-disk state stays valid.
    pub fn write_to(&self, page: &mut Page) -> Result<()> {
        if self.is_leaf && self.keys.len() != self.records.len() {
            strata_error!(
                "Refusing to serialize leaf with {} keys and {} records",
                self.keys.len(),
                self.records.len()
            );
            return Err(Error::internal(format!(
                "leaf has {} keys but {} records",
                self.keys.len(),
                self.records.len()
            )));
        }
        if !self.is_leaf && self.children.len() != self.keys.len() + 1 {
            strata_error!(
                "Refusing to serialize internal node with {} keys and {} children",
                self.keys.len(),
                self.children.len()
            );
            return Err(Error::internal(format!(
                "internal node has {} keys but {} children",
                self.keys.len(),
                self.children.len()
            )));
        }

        let size = self.serialized_size();
        if size > PAGE_SIZE {
            strata_error!("Serialized node spans {size} bytes, page is {PAGE_SIZE}");
            return Err(Error::page_overflow(format!(
                "serialized node spans {size} bytes, page is {PAGE_SIZE}"
            )));
        }

        let buf = page.bytes_mut();
        buf.fill(0);
        buf[0] = u8::from(self.is_leaf);
        buf[1..5].copy_from_slice(&T::DATA_TYPE.tag().to_le_bytes());
        buf[5..13].copy_from_slice(&(self.keys.len() as u64).to_le_bytes());

        let mut offset = NODE_HEADER_SIZE;
        for key in &self.keys {
            key.encode(&mut buf[offset..offset + T::CELL_SIZE]);
            offset += T::CELL_SIZE;
        }

        if self.is_leaf {
            for record in &self.records {
                buf[offset..offset + 8].copy_from_slice(&record.to_le_bytes());
                offset += 8;
            }
            buf[offset..offset + 8].copy_from_slice(&self.next_leaf.to_le_bytes());
        } else {
            for child in &self.children {
                buf[offset..offset + 8].copy_from_slice(&child.to_le_bytes());
                offset += 8;
            }
        }

        page.mark_dirty();
        Ok(())
    }

    /// Deserialize a node from a page
    ///
    /// Never fails: structural inconsistencies are repaired
    /// conservatively (truncating to the largest consistent prefix, or
    /// falling back to an empty leaf when the page cannot be
    /// interpreted at all) and reported as warnings. A subsequent save
    /// rewrites the corrected form.
    pub fn read_from(page: &Page, page_id: PageId, max_keys: usize) -> Self {
        if page.is_zeroed() {
            return Self::new_leaf();
        }

        let buf = page.bytes();
        let leaf_byte = buf[0];
        if leaf_byte > 1 {
            strata_warn!("Index node {page_id} has leaf marker {leaf_byte}; treating as leaf");
        }
        let is_leaf = leaf_byte != 0;

        let tag = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
        match DataType::from_tag(tag) {
            Some(dtype) if dtype == T::DATA_TYPE => {}
            Some(dtype) => {
                strata_warn!(
                    "Index node {page_id} is typed {dtype}, expected {}; loading as empty",
                    T::DATA_TYPE
                );
                return Self::new_leaf();
            }
            None => {
                strata_warn!("Index node {page_id} has unknown type tag {tag}; loading as empty");
                return Self::new_leaf();
            }
        }

        let mut count_raw = [0u8; 8];
        count_raw.copy_from_slice(&buf[5..13]);
        let key_count = u64::from_le_bytes(count_raw) as usize;
        if key_count > max_keys {
            strata_warn!(
                "Index node {page_id} claims {key_count} keys, limit is {max_keys}; loading as empty"
            );
            return Self::new_leaf();
        }

        let mut offset = NODE_HEADER_SIZE;
        let mut keys = Vec::with_capacity(key_count);
        while keys.len() < key_count && offset + T::CELL_SIZE <= PAGE_SIZE {
            keys.push(T::decode(&buf[offset..offset + T::CELL_SIZE]));
            offset += T::CELL_SIZE;
        }

        if is_leaf {
            let mut records = Vec::with_capacity(key_count);
            while records.len() < key_count && offset + 8 <= PAGE_SIZE {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[offset..offset + 8]);
                records.push(u64::from_le_bytes(raw));
                offset += 8;
            }

            if keys.len() != records.len() {
                let consistent = keys.len().min(records.len());
                strata_warn!(
                    "Leaf node {page_id} has {} keys and {} records; truncating to {consistent}",
                    keys.len(),
                    records.len()
                );
                keys.truncate(consistent);
                records.truncate(consistent);
            }

            let next_leaf = if offset + 8 <= PAGE_SIZE {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[offset..offset + 8]);
                u64::from_le_bytes(raw)
            } else {
                strata_warn!("Leaf node {page_id} has no room for its chain pointer; chain ends");
                INVALID_PAGE_ID
            };

            Self {
                is_leaf: true,
                keys,
                records,
                children: Vec::new(),
                next_leaf,
            }
        } else {
            let child_count = key_count + 1;
            let mut children = Vec::with_capacity(child_count);
            while children.len() < child_count && offset + 8 <= PAGE_SIZE {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[offset..offset + 8]);
                children.push(u64::from_le_bytes(raw));
                offset += 8;
            }

            if children.len() != keys.len() + 1 {
                strata_warn!(
                    "Internal node {page_id} has {} keys and {} children; truncating",
                    keys.len(),
                    children.len()
                );
                if children.is_empty() {
                    return Self::new_leaf();
                }
                keys.truncate(children.len() - 1);
            }

            Self {
                is_leaf: false,
                keys,
                records: Vec::new(),
                children,
                next_leaf: INVALID_PAGE_ID,
            }
        }
    }
}
