//! In-memory store for tests and ephemeral sessions

use super::{validate_key, KeyValueStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

fn handle_poison<T>(_err: PoisonError<T>) -> StoreError {
    StoreError::Other("Lock poisoned: a thread panicked while holding the lock".to_string())
}

/// In-memory store (non-persistent). Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.entries.read().map_err(handle_poison)?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries
            .write()
            .map_err(handle_poison)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries.write().map_err(handle_poison)?.remove(key);
        Ok(())
    }
}
