//! Table - a named, ordered set of equal-length typed columns

use crate::column::{open_column, read_column_meta, ColumnOps};
use crate::common::error::{Error, Result};
use crate::storage::buffer_pool::BufferPool;
use crate::strata_warn;
use crate::types::{DataType, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// A row at the table API boundary: column name to value
pub type Row = HashMap<String, Value>;

/// How many rows a bulk insert appends between buffer pool flushes
const BULK_FLUSH_INTERVAL: u64 = 1000;

/// A named ordered list of named columns, all of equal length
///
/// Column files live under `<root>/<table>/`; the table itself has no
/// file of its own, its schema is the set of column metadata pages and
/// their persisted ordinals.
pub struct Table {
    name: String,
    pool: Rc<RefCell<BufferPool>>,
    columns: Vec<Box<dyn ColumnOps>>,
    names: Vec<String>,
    by_name: HashMap<String, usize>,
    row_count: u64,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("names", &self.names)
            .field("row_count", &self.row_count)
            .finish()
    }
}

impl Table {
    /// Create an empty table
    pub(crate) fn create(name: String, pool: Rc<RefCell<BufferPool>>) -> Self {
        Self {
            name,
            pool,
            columns: Vec::new(),
            names: Vec::new(),
            by_name: HashMap::new(),
            row_count: 0,
        }
    }

    /// Reopen a table from the column files under `<root>/<name>/`
    ///
    /// Columns are ordered by the ordinal persisted in their metadata
    /// pages, so declaration order survives a reopen.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or corrupt column metadata.
    pub(crate) fn open_existing(
        name: String,
        pool: Rc<RefCell<BufferPool>>,
        root: &Path,
    ) -> Result<Self> {
        let mut discovered: Vec<(u32, String, DataType)> = Vec::new();

        for entry in std::fs::read_dir(root.join(&name))? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("data") {
                continue;
            }
            let Some(column_name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let full_name = format!("{name}/{column_name}");
            match read_column_meta(&full_name, &pool)? {
                Some(meta) => {
                    let Some(data_type) = meta.data_type_decoded() else {
                        continue; // read_column_meta already validated the tag
                    };
                    discovered.push((meta.ordinal, column_name.to_string(), data_type));
                }
                None => {
                    strata_warn!(
                        "Column {full_name} has a data file but no metadata; skipping it"
                    );
                }
            }
        }

        // Ordinal order, with the name as a deterministic tie-break.
        discovered.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        let mut table = Self::create(name.clone(), Rc::clone(&pool));
        for (ordinal, column_name, data_type) in discovered {
            let full_name = format!("{name}/{column_name}");
            let column = open_column(full_name, data_type, ordinal, Rc::clone(&pool))?;

            if column.size() != table.row_count {
                if !table.columns.is_empty() {
                    strata_warn!(
                        "Column {column_name} of table {name} has {} records, expected {}",
                        column.size(),
                        table.row_count
                    );
                }
                table.row_count = table.row_count.max(column.size());
            }

            table.by_name.insert(column_name.clone(), table.columns.len());
            table.names.push(column_name);
            table.columns.push(column);
        }

        Ok(table)
    }

    /// The table's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a column of the given type
    ///
    /// A column added to a non-empty table is backfilled with the
    /// type's default value so every column keeps the same length.
    ///
    /// # Errors
    ///
    /// Returns an already-exists error for a duplicate column name, or
    /// any error from creating the column files.
    pub fn add_column(&mut self, column_name: &str, data_type: DataType) -> Result<()> {
        validate_identifier(column_name, "column")?;
        if self.by_name.contains_key(column_name) {
            return Err(Error::already_exists(format!(
                "column {column_name} in table {}",
                self.name
            )));
        }

        let full_name = format!("{}/{column_name}", self.name);
        let ordinal = self.columns.len() as u32;
        let mut column = open_column(full_name, data_type, ordinal, Rc::clone(&self.pool))?;

        for _ in 0..self.row_count {
            column.append(data_type.default_value())?;
        }

        self.by_name.insert(column_name.to_string(), self.columns.len());
        self.names.push(column_name.to_string());
        self.columns.push(column);
        Ok(())
    }

    /// Insert one row
    ///
    /// Every declared column receives, in declaration order, the
    /// supplied value or its type's default. Unknown column names and
    /// mistyped values are rejected before anything is appended.
    ///
    /// # Errors
    ///
    /// Returns a schema error with no side effects, or an I/O error
    /// from an append.
    pub fn insert_row(&mut self, row: &Row) -> Result<()> {
        for (column_name, value) in row {
            let Some(&index) = self.by_name.get(column_name) else {
                return Err(Error::not_found(format!(
                    "column {column_name} in table {}",
                    self.name
                )));
            };
            let expected = self.columns[index].data_type();
            if value.data_type() != expected {
                return Err(Error::type_mismatch(format!(
                    "column {column_name} expects {expected}, got {}",
                    value.data_type()
                )));
            }
        }

        for index in 0..self.columns.len() {
            let value = match row.get(&self.names[index]) {
                Some(value) => value.clone(),
                None => self.columns[index].data_type().default_value(),
            };
            self.columns[index].append(value)?;
        }

        self.row_count += 1;
        Ok(())
    }

    /// Insert many rows, flushing the buffer pool every
    /// [`BULK_FLUSH_INTERVAL`] rows
    ///
    /// # Errors
    ///
    /// Returns the first row insertion or flush error; rows inserted
    /// before the failure remain inserted.
    pub fn bulk_insert(&mut self, rows: &[Row]) -> Result<()> {
        for row in rows {
            self.insert_row(row)?;

            if self.row_count % BULK_FLUSH_INTERVAL == 0 {
                self.pool.borrow_mut().flush_all()?;
            }
        }
        Ok(())
    }

    /// Look up a column by name
    pub fn column(&self, column_name: &str) -> Option<&dyn ColumnOps> {
        self.by_name
            .get(column_name)
            .map(|&index| self.columns[index].as_ref())
    }

    /// Look up a column by name, mutably
    pub fn column_mut(&mut self, column_name: &str) -> Option<&mut (dyn ColumnOps + 'static)> {
        self.by_name
            .get(column_name)
            .map(|&index| self.columns[index].as_mut())
    }

    /// Number of rows in the table
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Rows whose `index_column` value equals `value`
    ///
    /// `projection` selects the output columns; an empty projection
    /// means every column, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown column, a type
    /// mismatch for a mistyped probe value, or an I/O error.
    pub fn indexed_select(
        &self,
        index_column: &str,
        value: &Value,
        projection: &[&str],
    ) -> Result<Vec<Row>> {
        let column = self.column(index_column).ok_or_else(|| {
            Error::not_found(format!("column {index_column} in table {}", self.name))
        })?;
        let records = column.find(value)?;
        self.collect_rows(&records, projection)
    }

    /// Rows whose `index_column` value lies in `[low, high]` inclusive
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown column, a type
    /// mismatch for mistyped bounds, or an I/O error.
    pub fn range_select(
        &self,
        index_column: &str,
        low: &Value,
        high: &Value,
        projection: &[&str],
    ) -> Result<Vec<Row>> {
        let column = self.column(index_column).ok_or_else(|| {
            Error::not_found(format!("column {index_column} in table {}", self.name))
        })?;
        let records = column.find_range(low, high)?;
        self.collect_rows(&records, projection)
    }

    fn collect_rows(&self, records: &[u64], projection: &[&str]) -> Result<Vec<Row>> {
        let selected: Vec<&str> = if projection.is_empty() {
            self.names.iter().map(String::as_str).collect()
        } else {
            projection.to_vec()
        };

        let mut columns = Vec::with_capacity(selected.len());
        for column_name in &selected {
            let column = self.column(column_name).ok_or_else(|| {
                Error::not_found(format!("column {column_name} in table {}", self.name))
            })?;
            columns.push((*column_name, column));
        }

        let mut rows = Vec::with_capacity(records.len());
        for &record in records {
            let mut row = Row::with_capacity(columns.len());
            for (column_name, column) in &columns {
                row.insert((*column_name).to_string(), column.get(record)?);
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Check a table or column name before it becomes a path component
pub(crate) fn validate_identifier(name: &str, kind: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input(format!("{kind} name is empty")));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(Error::invalid_input(format!(
            "{kind} name {name:?} is not a valid path component"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::TempDir;
    use crate::storage::disk_manager::DiskManager;

    fn test_pool(dir: &TempDir) -> Rc<RefCell<BufferPool>> {
        let disk = DiskManager::new(dir.path()).expect("disk manager");
        Rc::new(RefCell::new(BufferPool::new(disk)))
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_add_column_and_insert() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("people".to_string(), test_pool(&dir));

        table.add_column("id", DataType::Int32).unwrap();
        table.add_column("name", DataType::Str).unwrap();
        assert_eq!(table.column_names(), ["id", "name"]);

        table
            .insert_row(&row(&[
                ("id", Value::Int32(1)),
                ("name", Value::Str("Ada".into())),
            ]))
            .unwrap();

        assert_eq!(table.row_count(), 1);
        let id = table.column("id").unwrap();
        assert_eq!(id.get(0).unwrap(), Value::Int32(1));
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("t".to_string(), test_pool(&dir));

        table.add_column("c", DataType::Int32).unwrap();
        let err = table.add_column("c", DataType::Int64).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_missing_values_get_typed_defaults() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("t".to_string(), test_pool(&dir));

        table.add_column("a", DataType::Int32).unwrap();
        table.add_column("b", DataType::Str).unwrap();
        table.add_column("c", DataType::Bool).unwrap();

        table.insert_row(&row(&[("a", Value::Int32(5))])).unwrap();

        assert_eq!(table.column("b").unwrap().get(0).unwrap(), Value::Str(String::new()));
        assert_eq!(table.column("c").unwrap().get(0).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_late_column_is_backfilled() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("t".to_string(), test_pool(&dir));

        table.add_column("a", DataType::Int32).unwrap();
        for i in 0..3 {
            table.insert_row(&row(&[("a", Value::Int32(i))])).unwrap();
        }

        table.add_column("b", DataType::Float64).unwrap();
        let b = table.column("b").unwrap();
        assert_eq!(b.size(), 3);
        for record in 0..3 {
            assert_eq!(b.get(record).unwrap(), Value::Float64(0.0));
        }
    }

    #[test]
    fn test_unknown_column_rejected_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("t".to_string(), test_pool(&dir));
        table.add_column("a", DataType::Int32).unwrap();

        let err = table
            .insert_row(&row(&[("ghost", Value::Int32(1))]))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column("a").unwrap().size(), 0);
    }

    #[test]
    fn test_type_mismatch_rejected_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("t".to_string(), test_pool(&dir));
        table.add_column("a", DataType::Int32).unwrap();
        table.add_column("b", DataType::Str).unwrap();

        let err = table
            .insert_row(&row(&[
                ("a", Value::Int32(1)),
                ("b", Value::Int32(2)), // wrong type
            ]))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column("a").unwrap().size(), 0);
    }

    #[test]
    fn test_indexed_select_with_projection() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("t".to_string(), test_pool(&dir));
        table.add_column("id", DataType::Int32).unwrap();
        table.add_column("dept", DataType::Int32).unwrap();

        for (id, dept) in [(1, 10), (2, 20), (3, 10)] {
            table
                .insert_row(&row(&[
                    ("id", Value::Int32(id)),
                    ("dept", Value::Int32(dept)),
                ]))
                .unwrap();
        }

        let hits = table
            .indexed_select("dept", &Value::Int32(10), &["id"])
            .unwrap();
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert_eq!(hit.len(), 1);
            assert!(hit.contains_key("id"));
        }
        let ids: Vec<&Value> = hits.iter().map(|r| &r["id"]).collect();
        assert!(ids.contains(&&Value::Int32(1)));
        assert!(ids.contains(&&Value::Int32(3)));
    }

    #[test]
    fn test_range_select_returns_full_rows_by_default() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::create("t".to_string(), test_pool(&dir));
        table.add_column("id", DataType::Int32).unwrap();
        table.add_column("score", DataType::Float64).unwrap();

        for i in 0..10 {
            table
                .insert_row(&row(&[
                    ("id", Value::Int32(i)),
                    ("score", Value::Float64(f64::from(i) * 10.0)),
                ]))
                .unwrap();
        }

        let hits = table
            .range_select("score", &Value::Float64(20.0), &Value::Float64(40.0), &[])
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_select_on_unknown_column_is_not_found() {
        let dir = TempDir::new().unwrap();
        let table = Table::create("t".to_string(), test_pool(&dir));
        let err = table
            .indexed_select("nope", &Value::Int32(1), &[])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_bulk_insert_leaves_no_dirty_pages_at_flush_points() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir);
        let mut table = Table::create("t".to_string(), Rc::clone(&pool));
        table.add_column("n", DataType::Int64).unwrap();

        let rows: Vec<Row> = (0..2000)
            .map(|i| row(&[("n", Value::Int64(i))]))
            .collect();
        table.bulk_insert(&rows).unwrap();

        assert_eq!(table.row_count(), 2000);
        // 2000 is a flush boundary, so the pool drained its dirty pages.
        assert_eq!(pool.borrow().dirty_count(), 0);
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("salary", "column").is_ok());
        assert!(validate_identifier("", "column").is_err());
        assert!(validate_identifier("a/b", "column").is_err());
        assert!(validate_identifier("..", "table").is_err());
    }
}
