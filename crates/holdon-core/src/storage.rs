//! Atomic JSON state files backing the durable stores.
//!
//! Each durable collection lives under one storage key, and each key maps
//! to `<data_dir>/<key>.json`. Writes go to a temporary file in the same
//! directory and are renamed into place, so a crash mid-write never leaves
//! a torn file behind. There is no per-record update primitive: callers
//! read the whole collection, modify it, and write it back, which is why
//! the stores built on top of this serialize their read-modify-write
//! cycles behind a mutex.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Errors from the JSON state-file layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt or mismatched JSON on disk.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Directory-backed key-value persistence for JSON collections.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// write, not here.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the state files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read the value stored under `key`.
    ///
    /// A missing file is `Ok(None)` (the collection simply does not exist
    /// yet). Corrupt JSON surfaces as an error; callers decide whether that
    /// degrades to an empty default.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure other than not-found, or if the
    /// file contents do not deserialize as `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let path = self.path_for(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Atomically replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the temporary
    /// file cannot be written, or the rename fails.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));

        let data = serde_json::to_vec_pretty(value)?;
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(key, bytes = data.len(), "state file written");
        Ok(())
    }
}
