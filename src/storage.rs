//! Object storage, and CSV staging of artifacts on local disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Named-blob storage shared between stages and runs.
pub trait BlobStore: Send + Sync {
    /// Whether `name` exists.
    fn exists(&self, name: &str) -> Result<bool>;
    /// Copy blob `name` to `local`. [`Error::MissingArtifact`] if absent.
    fn download(&self, name: &str, local: &Path) -> Result<()>;
    /// Copy `local` to blob `name`, replacing it.
    fn upload(&self, local: &Path, name: &str) -> Result<()>;
    /// Read blob `name` as text. [`Error::MissingArtifact`] if absent.
    fn read_string(&self, name: &str) -> Result<String>;
    /// Replace blob `name` with `data`.
    fn write_string(&self, name: &str, data: &str) -> Result<()>;
}

/// [`BlobStore`] backed by a directory; blob names are relative paths.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Store rooted at `root`, created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn writable_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

impl BlobStore for LocalBlobStore {
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path(name).is_file())
    }

    fn download(&self, name: &str, local: &Path) -> Result<()> {
        if !self.exists(name)? {
            return Err(Error::MissingArtifact(name.to_owned()));
        }
        ensure_parent(local)?;
        fs::copy(self.path(name), local)?;
        Ok(())
    }

    fn upload(&self, local: &Path, name: &str) -> Result<()> {
        let path = self.writable_path(name)?;
        fs::copy(local, path)?;
        Ok(())
    }

    fn read_string(&self, name: &str) -> Result<String> {
        if !self.exists(name)? {
            return Err(Error::MissingArtifact(name.to_owned()));
        }
        Ok(fs::read_to_string(self.path(name))?)
    }

    fn write_string(&self, name: &str, data: &str) -> Result<()> {
        let path = self.writable_path(name)?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Create the parent directory of `path`, if any.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Read all rows of a headed CSV file.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// Write `rows` to `path` under `header`, truncating any existing file.
///
/// `header` must list `T`'s serialized fields in order. It is written even when `rows`
/// is empty.
pub fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write pre-rendered records to `path`, truncating any existing file.
pub fn write_csv_records<I, R>(path: &Path, header: &[String], records: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}
