//! Database - the top-level handle over tables, the buffer pool, and
//! the disk manager

use crate::common::error::{Error, Result};
use crate::common::logging::Timer;
use crate::storage::buffer_pool::BufferPool;
use crate::storage::disk_manager::DiskManager;
use crate::table::{validate_identifier, Table};
use crate::{strata_debug, strata_info, strata_warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Row counts per table, as reported by [`Database::stats`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    /// Table name
    pub name: String,
    /// Number of rows in the table
    pub row_count: u64,
}

/// A snapshot of database shape for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Database name, derived from the root directory
    pub name: String,
    /// Number of tables
    pub table_count: usize,
    /// Per-table statistics, sorted by table name
    pub tables: Vec<TableStats>,
}

/// A disk-backed columnar database under one root directory
///
/// The database owns the buffer pool (and through it the disk
/// manager); tables and columns share the pool. All state reachable
/// from here is single-threaded.
pub struct Database {
    name: String,
    root: PathBuf,
    pool: Rc<RefCell<BufferPool>>,
    tables: HashMap<String, Table>,
}

impl Database {
    /// Open a database rooted at `root`, creating the directory if
    /// needed and rediscovering any tables persisted by earlier runs
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created or scanned, or if
    /// a persisted column is corrupt.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "strata".to_string());
        let timer = Timer::start(format!("open database {name}"));

        let disk = DiskManager::new(&root)?;
        let pool = Rc::new(RefCell::new(BufferPool::new(disk)));

        let mut tables = HashMap::new();
        for entry in std::fs::read_dir(&root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(table_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            let table = Table::open_existing(table_name.clone(), Rc::clone(&pool), &root)?;
            strata_debug!(
                "Reopened table {table_name} with {} rows",
                table.row_count()
            );
            tables.insert(table_name, table);
        }

        strata_info!("Opened database {name} with {} tables", tables.len());
        timer.stop();
        Ok(Self {
            name,
            root,
            pool,
            tables,
        })
    }

    /// The database name, derived from the root directory
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a table
    ///
    /// # Errors
    ///
    /// Returns an already-exists error for a duplicate name, or an
    /// invalid input error for a name that cannot be a directory.
    pub fn create_table(&mut self, table_name: &str) -> Result<&mut Table> {
        validate_identifier(table_name, "table")?;
        if self.tables.contains_key(table_name) {
            return Err(Error::already_exists(format!("table {table_name}")));
        }

        // Materialize the directory so an empty table survives a reopen.
        std::fs::create_dir_all(self.root.join(table_name))?;

        let table = Table::create(table_name.to_string(), Rc::clone(&self.pool));
        Ok(self.tables.entry(table_name.to_string()).or_insert(table))
    }

    /// Look up a table by name
    pub fn get_table(&mut self, table_name: &str) -> Option<&mut Table> {
        self.tables.get_mut(table_name)
    }

    /// Table names, sorted
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Drop a table: forget it, discard its buffered pages without
    /// write-back, and delete its files
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown table, or an I/O error
    /// if its directory cannot be removed.
    pub fn drop_table(&mut self, table_name: &str) -> Result<()> {
        if self.tables.remove(table_name).is_none() {
            return Err(Error::not_found(format!("table {table_name}")));
        }
        self.pool.borrow_mut().remove_dir(table_name)?;
        strata_info!("Dropped table {table_name}");
        Ok(())
    }

    /// Write every dirty page back to the disk manager
    ///
    /// # Errors
    ///
    /// Returns the first write-back failure.
    pub fn flush_all(&mut self) -> Result<()> {
        self.pool.borrow_mut().flush_all()
    }

    /// Flush everything, push it to stable storage, and consume the
    /// database handle
    ///
    /// # Errors
    ///
    /// Returns an error if a write-back or fsync fails; the handle is
    /// consumed either way.
    pub fn close(mut self) -> Result<()> {
        let result = self.pool.borrow_mut().sync();
        self.tables.clear();
        strata_info!("Closed database {}", self.name);
        result
    }

    /// A snapshot of table shapes for diagnostics
    pub fn stats(&self) -> DatabaseStats {
        let mut tables: Vec<TableStats> = self
            .tables
            .iter()
            .map(|(name, table)| TableStats {
                name: name.clone(),
                row_count: table.row_count(),
            })
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));

        DatabaseStats {
            name: self.name.clone(),
            table_count: tables.len(),
            tables,
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Mirror an explicit close for handles that go out of scope.
        if let Err(e) = self.pool.borrow_mut().sync() {
            strata_warn!("Database teardown flush failed: {e}");
        }
    }
}
