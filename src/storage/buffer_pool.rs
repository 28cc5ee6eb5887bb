//! Buffer pool - caches pages by (file, page id) with LRU eviction

use crate::common::error::Result;
use crate::common::logging::Timer;
use crate::storage::disk_manager::DiskManager;
use crate::storage::page::Page;
use crate::storage::page_constants::{PageId, BUFFER_POOL_SIZE};
use crate::{strata_trace, strata_warn};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Identity of a resident page: the logical file name plus the page id
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageKey {
    /// Logical file name relative to the database root
    pub file: String,
    /// Page id within that file
    pub page_id: PageId,
}

/// Shared handle to a resident page
///
/// Holding a handle pins the page: eviction only considers pages whose
/// sole owner is the pool. Callers keep handles for the duration of a
/// single operation and drop them on scope exit.
pub type PageHandle = Rc<RefCell<Page>>;

/// Buffer pool - exclusive owner of resident pages across all files
///
/// Residency is bounded by the pool capacity. Recency is tracked with a
/// monotonic fetch counter per page and a stamp-ordered index, so the
/// eviction victim (the least recently used unpinned page) is
/// deterministic.
pub struct BufferPool {
    capacity: usize,
    disk: DiskManager,
    pages: HashMap<PageKey, PageHandle>,
    stamps: HashMap<PageKey, u64>,
    recency: BTreeMap<u64, PageKey>,
    clock: u64,
}

impl BufferPool {
    /// Create a buffer pool with the default capacity of
    /// [`BUFFER_POOL_SIZE`] resident pages
    pub fn new(disk: DiskManager) -> Self {
        Self::with_capacity(disk, BUFFER_POOL_SIZE)
    }

    /// Create a buffer pool with an explicit capacity
    pub fn with_capacity(disk: DiskManager, capacity: usize) -> Self {
        Self {
            capacity,
            disk,
            pages: HashMap::new(),
            stamps: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    /// Fetch a page, reading it from disk if it is not resident
    ///
    /// A page that has never been written reads as all zero bytes. The
    /// returned handle keeps the page pinned until it is dropped. The
    /// fetched page's recency is updated before returning, so it cannot
    /// be the next eviction victim.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk read, or the write-back of an
    /// eviction victim, fails. A failed fetch does not change residency.
    pub fn fetch_page(&mut self, file_name: &str, page_id: PageId) -> Result<PageHandle> {
        let key = PageKey {
            file: file_name.to_string(),
            page_id,
        };

        if let Some(handle) = self.pages.get(&key) {
            let handle = Rc::clone(handle);
            self.touch(&key);
            return Ok(handle);
        }

        let page = self.disk.read_page(file_name, page_id)?;

        if self.pages.len() >= self.capacity {
            self.evict_one()?;
        }

        let handle = Rc::new(RefCell::new(page));
        self.pages.insert(key.clone(), Rc::clone(&handle));
        self.touch(&key);
        Ok(handle)
    }

    /// Write one resident dirty page back to disk and clear its dirty bit
    ///
    /// A miss or a clean page is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk write fails; the dirty bit is left
    /// set in that case.
    pub fn flush_page(&mut self, file_name: &str, page_id: PageId) -> Result<()> {
        let key = PageKey {
            file: file_name.to_string(),
            page_id,
        };

        if let Some(handle) = self.pages.get(&key) {
            let mut page = handle.borrow_mut();
            if page.is_dirty() {
                self.disk.write_page(file_name, page_id, &page)?;
                page.clear_dirty();
            }
        }
        Ok(())
    }

    /// Write every resident dirty page back to disk
    ///
    /// After a successful return no resident page has its dirty bit set.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; pages flushed before the failure
    /// stay clean, the rest keep their dirty bits.
    pub fn flush_all(&mut self) -> Result<()> {
        let timer = Timer::start("buffer pool flush_all");
        let disk = &mut self.disk;
        for (key, handle) in &self.pages {
            let mut page = handle.borrow_mut();
            if page.is_dirty() {
                disk.write_page(&key.file, key.page_id, &page)?;
                page.clear_dirty();
            }
        }
        timer.stop();
        Ok(())
    }

    /// Flush everything and push file contents to stable storage
    ///
    /// # Errors
    ///
    /// Returns an error if a write-back or an fsync fails.
    pub fn sync(&mut self) -> Result<()> {
        self.flush_all()?;
        self.disk.sync_all()
    }

    /// Drop all resident pages under `dir/` without write-back and
    /// delete the directory's files
    ///
    /// # Errors
    ///
    /// Returns an error if the directory removal fails.
    pub fn remove_dir(&mut self, dir: &str) -> Result<()> {
        let prefix = format!("{dir}/");
        let discarded: Vec<PageKey> = self
            .pages
            .keys()
            .filter(|key| key.file.starts_with(&prefix))
            .cloned()
            .collect();
        for key in discarded {
            self.pages.remove(&key);
            if let Some(stamp) = self.stamps.remove(&key) {
                self.recency.remove(&stamp);
            }
        }
        self.disk.remove_dir(dir)
    }

    /// Number of resident pages
    pub fn resident_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of resident pages whose dirty bit is set
    pub fn dirty_count(&self) -> usize {
        self.pages
            .values()
            .filter(|handle| handle.borrow().is_dirty())
            .count()
    }

    /// Check whether a page is currently resident
    pub fn is_resident(&self, file_name: &str, page_id: PageId) -> bool {
        self.pages.contains_key(&PageKey {
            file: file_name.to_string(),
            page_id,
        })
    }

    /// The pool capacity in pages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn touch(&mut self, key: &PageKey) {
        self.clock += 1;
        if let Some(old_stamp) = self.stamps.insert(key.clone(), self.clock) {
            self.recency.remove(&old_stamp);
        }
        self.recency.insert(self.clock, key.clone());
    }

    fn evict_one(&mut self) -> Result<()> {
        // Oldest stamp first; pages with outstanding handles are pinned.
        let victim = self.recency.iter().find_map(|(stamp, key)| {
            let handle = &self.pages[key];
            (Rc::strong_count(handle) == 1).then(|| (*stamp, key.clone()))
        });

        let Some((stamp, key)) = victim else {
            strata_warn!("Buffer pool over capacity with every page pinned; skipping eviction");
            return Ok(());
        };

        {
            let handle = &self.pages[&key];
            let mut page = handle.borrow_mut();
            if page.is_dirty() {
                self.disk.write_page(&key.file, key.page_id, &page)?;
                page.clear_dirty();
            }
        }

        self.pages.remove(&key);
        self.stamps.remove(&key);
        self.recency.remove(&stamp);
        strata_trace!("Evicted page {} of {}", key.page_id, key.file);
        Ok(())
    }
}
