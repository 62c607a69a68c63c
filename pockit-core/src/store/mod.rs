//! Key-value persistence
//!
//! A small string-keyed store that persisted feature state is loaded from at
//! construction and written back to on every mutation. Values are JSON text.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::StoreConfig;

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// String-keyed persistence backend
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Keys double as file names in [`FileStore`], so they are kept to a
/// conservative character set everywhere.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Open the backend selected by config: a [`FileStore`] under `data_dir`
/// when persistence is on, otherwise a throwaway [`MemoryStore`].
pub fn open(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    if config.persist {
        debug!(data_dir = %config.data_dir.display(), "opening file store");
        Ok(Arc::new(FileStore::new(&config.data_dir)?))
    } else {
        debug!("persistence disabled, using memory store");
        Ok(Arc::new(MemoryStore::new()))
    }
}

/// Load and decode a JSON record
pub fn load_record<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Deserialization(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}

/// Encode and store a JSON record
pub fn save_record<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    record: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(record)
        .map_err(|e| StoreError::Serialization(format!("{}: {}", key, e)))?;
    store.put(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("impulse_shield").is_ok());
        assert!(validate_key("v1.state-backup").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("with space").is_err());
    }

    #[test]
    fn test_record_helpers() {
        let store = MemoryStore::new();
        let record = Record {
            name: "pocket".to_string(),
            count: 3,
        };

        assert_eq!(load_record::<Record>(&store, "rec").unwrap(), None);
        save_record(&store, "rec", &record).unwrap();
        assert_eq!(load_record::<Record>(&store, "rec").unwrap(), Some(record));
    }

    #[test]
    fn test_open_respects_persist_flag() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StoreConfig {
            data_dir: dir.path().join("data"),
            persist: true,
        };
        let store = open(&config).unwrap();
        store.put("k", "v").unwrap();
        assert!(dir.path().join("data").join("k.json").exists());

        let config = StoreConfig {
            data_dir: dir.path().join("unused"),
            persist: false,
        };
        let store = open(&config).unwrap();
        store.put("k", "v").unwrap();
        assert!(!dir.path().join("unused").exists());
    }

    #[test]
    fn test_load_record_corrupt() {
        let store = MemoryStore::new();
        store.put("rec", "{not json").unwrap();

        let err = load_record::<Record>(&store, "rec").unwrap_err();
        assert!(matches!(err, StoreError::Deserialization(_)));
    }
}
