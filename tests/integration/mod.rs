//! Integration test framework for the strata storage engine
//!
//! Utilities for tests that exercise the whole stack, from the database
//! API down to the bytes on disk.

use strata::common::test_utils::{init_test_logging, TempDir};
use strata::common::Result;
use std::path::{Path, PathBuf};

/// Integration test environment: a temp directory holding one database
pub struct TestEnvironment {
    /// Temporary directory for the database root
    pub temp_dir: TempDir,
    /// Database root within the temp directory
    pub db_root: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment
    pub fn new() -> Result<Self> {
        init_test_logging();

        let temp_dir = TempDir::new()?;
        let db_root = temp_dir.path().join("db");

        Ok(Self { temp_dir, db_root })
    }

    /// The database root path
    pub fn db_root(&self) -> &Path {
        &self.db_root
    }

    /// Read the raw bytes of a column file under the database root
    pub fn read_column_file(&self, relative: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.db_root.join(relative))?)
    }
}
