//! File-backed store
//!
//! Layout: one `<key>.json` file per key under the base directory. Writes go
//! to `<key>.json.tmp` first and are renamed into place, so a crash mid-write
//! leaves the previous value intact.

use super::{validate_key, KeyValueStore, StoreError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tracing::trace;

/// File-based store rooted at a directory
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open a store at `base_path`, creating the directory if needed
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(FileStore { base_path })
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        match fs::read_to_string(self.record_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let path = self.record_path(key);
        let tmp = path.with_extension("json.tmp");

        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        trace!(key, bytes = value.len(), "record written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
