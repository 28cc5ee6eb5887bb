//! Disk manager - owns the database files and performs page-granular I/O

use crate::common::error::{Error, Result};
use crate::storage::page::Page;
use crate::{strata_debug, strata_warn};
use crate::storage::page_constants::PageId;
use crate::storage::page_io;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Disk manager - exclusive owner of the file handles under a root directory
///
/// Logical file names may contain `/` separators; the disk manager
/// materializes them as subdirectories on first reference. Files are
/// opened read-write without truncation, so reopening a database sees
/// the pages written by earlier runs.
pub struct DiskManager {
    root: PathBuf,
    files: HashMap<String, File>,
}

impl DiskManager {
    /// Create a disk manager rooted at the given directory
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            files: HashMap::new(),
        })
    }

    /// The root directory this manager owns
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read one page from a file
    ///
    /// A page past end-of-file reads as all zero bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the read fails.
    pub fn read_page(&mut self, file_name: &str, page_id: PageId) -> Result<Page> {
        let file = self.file_handle(file_name)?;
        page_io::read_page_from_file(file, page_id)
    }

    /// Write one page to a file, extending it as needed
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the write fails.
    pub fn write_page(&mut self, file_name: &str, page_id: PageId, page: &Page) -> Result<()> {
        let file = self.file_handle(file_name)?;
        page_io::write_page_to_file(file, page_id, page)
    }

    /// Push all buffered writes to stable storage
    ///
    /// # Errors
    ///
    /// Returns an error naming the first file whose sync failed.
    pub fn sync_all(&mut self) -> Result<()> {
        for (name, file) in &self.files {
            file.sync_all()
                .map_err(|e| Error::io(format!("sync of {name} failed: {e}")))?;
        }
        Ok(())
    }

    /// Close any open handles under `dir` and delete the directory
    ///
    /// Used when a table is dropped: `dir` is the table name relative to
    /// the database root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn remove_dir(&mut self, dir: &str) -> Result<()> {
        let prefix = format!("{dir}/");
        self.files.retain(|name, _| !name.starts_with(&prefix));

        let path = self.root.join(dir);
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        Ok(())
    }

    /// Number of cached file handles
    pub fn open_file_count(&self) -> usize {
        self.files.len()
    }

    fn file_handle(&mut self, file_name: &str) -> Result<&mut File> {
        match self.files.entry(file_name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.root.join(file_name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&path)
                    .map_err(|e| Error::io(format!("open of {} failed: {e}", path.display())))?;

                strata_debug!("Materialized file {}", path.display());
                Ok(entry.insert(file))
            }
        }
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        // Handles close on drop; make a best effort to sync them first.
        if let Err(e) = self.sync_all() {
            strata_warn!("Disk manager teardown sync failed: {e}");
        }
    }
}
