//! Persistent B+ tree index from typed keys to record ids

use crate::common::error::{Error, Result};
use crate::index::node::{node_capacity, Node};
use crate::storage::buffer_pool::BufferPool;
use crate::storage::page_constants::{PageId, RecordId, BTREE_ORDER, INVALID_PAGE_ID};
use crate::strata_error;
use crate::types::CellType;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Upper bound on descent depth; a deeper walk means a cyclic or
/// corrupt child reference
const MAX_DEPTH: usize = 64;

/// Persistent ordered index from keys of type `T` to record ids
///
/// Duplicate keys are permitted. Nodes live one per page in the
/// column's index file; node ids start at 1 because page 0 holds the
/// column metadata, and [`INVALID_PAGE_ID`] doubles as the leaf chain
/// terminator. All node access goes through the shared buffer pool, and
/// every `load → modify → save` sequence materializes a fresh copy and
/// writes it back through a dirty page.
pub struct BPlusTree<T: CellType> {
    file: String,
    pool: Rc<RefCell<BufferPool>>,
    root: PageId,
    next_page_id: PageId,
    max_keys: usize,
    _key: std::marker::PhantomData<T>,
}

impl<T: CellType> BPlusTree<T> {
    /// Open a tree over `file` with the default order [`BTREE_ORDER`]
    ///
    /// `root` and `next_page_id` come from the column metadata page; a
    /// fresh index passes [`INVALID_PAGE_ID`] and 1.
    pub fn new(
        file: String,
        pool: Rc<RefCell<BufferPool>>,
        root: PageId,
        next_page_id: PageId,
    ) -> Self {
        Self::with_order(file, pool, root, next_page_id, BTREE_ORDER)
    }

    /// Open a tree with an explicit order (testing knob)
    ///
    /// The effective per-node key capacity is additionally limited by
    /// what fits in one page for this key width.
    pub fn with_order(
        file: String,
        pool: Rc<RefCell<BufferPool>>,
        root: PageId,
        next_page_id: PageId,
        order: usize,
    ) -> Self {
        debug_assert!(order >= 3, "B+ tree order must be at least 3");
        Self {
            file,
            pool,
            root,
            next_page_id: next_page_id.max(1),
            max_keys: node_capacity(T::CELL_SIZE, order),
            _key: std::marker::PhantomData,
        }
    }

    /// Page id of the root node, [`INVALID_PAGE_ID`] while empty
    pub fn root_page_id(&self) -> PageId {
        self.root
    }

    /// High-water mark for node allocation, persisted in the column
    /// metadata
    pub fn next_page_id(&self) -> PageId {
        self.next_page_id
    }

    /// Insert one `(key, record)` pair
    ///
    /// Equal keys insert at the first matching position; splits
    /// propagate upward and may grow a new root.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or if a node cannot be
    /// serialized; the tree state prior to the failing save remains
    /// valid.
    pub fn insert(&mut self, key: T, record: RecordId) -> Result<()> {
        if self.root == INVALID_PAGE_ID {
            let root_id = self.allocate_node()?;
            self.save_node(root_id, &Node::new_leaf())?;
            self.root = root_id;
        }

        if let Some((promoted, new_child)) = self.insert_into(self.root, &key, record, 0)? {
            let new_root_id = self.allocate_node()?;
            let mut new_root = Node::new_internal();
            new_root.keys.push(promoted);
            new_root.children.push(self.root);
            new_root.children.push(new_child);
            self.save_node(new_root_id, &new_root)?;
            self.root = new_root_id;
        }
        Ok(())
    }

    /// Collect every record id whose key equals `key`
    ///
    /// Duplicates may span leaves, so the scan follows the leaf chain
    /// until a greater key is observed.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn search(&self, key: &T) -> Result<Vec<RecordId>> {
        if self.root == INVALID_PAGE_ID {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut page_id = self.find_leaf(key)?;
        'chain: while page_id != INVALID_PAGE_ID {
            let node = self.load_node(page_id)?;
            for (k, record) in node.keys.iter().zip(&node.records) {
                match k.key_cmp(key) {
                    Ordering::Less => {}
                    Ordering::Equal => results.push(*record),
                    Ordering::Greater => break 'chain,
                }
            }
            page_id = node.next_leaf;
        }
        Ok(results)
    }

    /// Collect every record id whose key lies in `[low, high]` inclusive
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn range_search(&self, low: &T, high: &T) -> Result<Vec<RecordId>> {
        if self.root == INVALID_PAGE_ID {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut page_id = self.find_leaf(low)?;
        'chain: while page_id != INVALID_PAGE_ID {
            let node = self.load_node(page_id)?;
            for (k, record) in node.keys.iter().zip(&node.records) {
                if k.key_cmp(high) == Ordering::Greater {
                    break 'chain;
                }
                if k.key_cmp(low) != Ordering::Less {
                    results.push(*record);
                }
            }
            page_id = node.next_leaf;
        }
        Ok(results)
    }

    /// Enumerate every `(key, record)` pair in key order by walking the
    /// leaf chain from the leftmost leaf
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn scan(&self) -> Result<Vec<(T, RecordId)>> {
        if self.root == INVALID_PAGE_ID {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut page_id = self.leftmost_leaf()?;
        while page_id != INVALID_PAGE_ID {
            let node = self.load_node(page_id)?;
            for (k, record) in node.keys.iter().zip(&node.records) {
                results.push((k.clone(), *record));
            }
            page_id = node.next_leaf;
        }
        Ok(results)
    }

    /// Number of levels from root to leaf; 0 for an empty tree
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a cyclic child reference.
    pub fn height(&self) -> Result<usize> {
        if self.root == INVALID_PAGE_ID {
            return Ok(0);
        }

        let mut height = 1;
        let mut page_id = self.root;
        for _ in 0..MAX_DEPTH {
            let node = self.load_node(page_id)?;
            if node.is_leaf {
                return Ok(height);
            }
            page_id = node.children[0];
            height += 1;
        }
        Err(Error::corruption("index descent exceeded maximum depth"))
    }

    fn insert_into(
        &mut self,
        page_id: PageId,
        key: &T,
        record: RecordId,
        depth: usize,
    ) -> Result<Option<(T, PageId)>> {
        if depth >= MAX_DEPTH {
            return Err(Error::corruption("index descent exceeded maximum depth"));
        }

        let mut node = self.load_node(page_id)?;
        if node.is_leaf {
            let pos = node.keys.partition_point(|k| k.key_cmp(key) == Ordering::Less);
            node.keys.insert(pos, key.clone());
            node.records.insert(pos, record);

            if node.keys.len() > self.max_keys {
                return self.split_leaf(page_id, node).map(Some);
            }
            self.save_node(page_id, &node)?;
            Ok(None)
        } else {
            let child_index = node.keys.partition_point(|k| k.key_cmp(key) == Ordering::Less);
            let child_id = node.children[child_index];

            if let Some((promoted, new_child)) = self.insert_into(child_id, key, record, depth + 1)? {
                node.keys.insert(child_index, promoted);
                node.children.insert(child_index + 1, new_child);

                if node.keys.len() > self.max_keys {
                    return self.split_internal(page_id, node).map(Some);
                }
                self.save_node(page_id, &node)?;
            }
            Ok(None)
        }
    }

    /// Split an overflowing leaf; the upper half moves to a new leaf
    /// that is stitched into the chain, and its first key is promoted.
    fn split_leaf(&mut self, page_id: PageId, mut node: Node<T>) -> Result<(T, PageId)> {
        let mid = node.keys.len() / 2;
        let new_page_id = self.allocate_node()?;

        let mut new_node = Node::new_leaf();
        new_node.keys = node.keys.split_off(mid);
        new_node.records = node.records.split_off(mid);
        new_node.next_leaf = node.next_leaf;
        node.next_leaf = new_page_id;

        let promoted = new_node.keys[0].clone();
        self.save_node(page_id, &node)?;
        self.save_node(new_page_id, &new_node)?;
        Ok((promoted, new_page_id))
    }

    /// Split an overflowing internal node; the middle key moves up
    /// without being retained in either half.
    fn split_internal(&mut self, page_id: PageId, mut node: Node<T>) -> Result<(T, PageId)> {
        let mid = node.keys.len() / 2;
        let new_page_id = self.allocate_node()?;

        let mut new_node = Node::new_internal();
        new_node.keys = node.keys.split_off(mid + 1);
        new_node.children = node.children.split_off(mid + 1);
        let promoted = node.keys.pop().ok_or_else(|| {
            strata_error!("Split of internal node {page_id} found no key to promote");
            Error::internal("split of an internal node without keys")
        })?;

        self.save_node(page_id, &node)?;
        self.save_node(new_page_id, &new_node)?;
        Ok((promoted, new_page_id))
    }

    fn find_leaf(&self, key: &T) -> Result<PageId> {
        let mut page_id = self.root;
        for _ in 0..MAX_DEPTH {
            let node = self.load_node(page_id)?;
            if node.is_leaf {
                return Ok(page_id);
            }
            let child_index = node.keys.partition_point(|k| k.key_cmp(key) == Ordering::Less);
            page_id = node.children[child_index];
        }
        Err(Error::corruption("index descent exceeded maximum depth"))
    }

    fn leftmost_leaf(&self) -> Result<PageId> {
        let mut page_id = self.root;
        for _ in 0..MAX_DEPTH {
            let node = self.load_node(page_id)?;
            if node.is_leaf {
                return Ok(page_id);
            }
            page_id = node.children[0];
        }
        Err(Error::corruption("index descent exceeded maximum depth"))
    }

    fn allocate_node(&mut self) -> Result<PageId> {
        let page_id = self.next_page_id;
        self.next_page_id = self.next_page_id.checked_add(1).ok_or_else(|| {
            strata_error!("Index {} exhausted its page id space", self.file);
            Error::page_overflow("index page id space exhausted")
        })?;
        Ok(page_id)
    }

    fn load_node(&self, page_id: PageId) -> Result<Node<T>> {
        let handle = self.pool.borrow_mut().fetch_page(&self.file, page_id)?;
        let page = handle.borrow();
        Ok(Node::read_from(&page, page_id, self.max_keys))
    }

    fn save_node(&self, page_id: PageId, node: &Node<T>) -> Result<()> {
        let handle = self.pool.borrow_mut().fetch_page(&self.file, page_id)?;
        let mut page = handle.borrow_mut();
        node.write_to(&mut page)
    }
}
