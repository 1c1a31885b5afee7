//! Bulk load of the final datasets into warehouse tables.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage::ensure_parent;

/// Loads headed CSV files into named tables. Replace/append semantics belong to the
/// warehouse.
pub trait Warehouse: Send + Sync {
    /// Load the rows of `csv_path` (header skipped) into `table`. Returns rows loaded.
    fn load_csv(&self, csv_path: &Path, table: &str) -> Result<u64>;
}

/// [`Warehouse`] keeping one appended CSV file per table under a directory.
#[derive(Debug, Clone)]
pub struct LocalWarehouse {
    root: PathBuf,
}

impl LocalWarehouse {
    /// Warehouse rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File backing `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{}.csv", table))
    }
}

impl Warehouse for LocalWarehouse {
    fn load_csv(&self, csv_path: &Path, table: &str) -> Result<u64> {
        let mut reader = csv::Reader::from_path(csv_path)?;
        let header = reader.headers()?.clone();

        let table_path = self.table_path(table);
        ensure_parent(&table_path)?;
        let is_new = fs::metadata(&table_path).map_or(true, |meta| 0 == meta.len());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&table_path)?;
        let mut writer = csv::Writer::from_writer(file);
        if is_new {
            writer.write_record(&header)?;
        }

        let mut loaded = 0;
        for record in reader.records() {
            writer.write_record(&record?)?;
            loaded += 1;
        }
        writer.flush()?;
        log::info!("Loaded {} rows into table `{}`.", loaded, table);
        Ok(loaded)
    }
}
