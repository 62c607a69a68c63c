//! Test fixtures: recording notifier, failing and counting stores, shield builder

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::shield::{Amount, ImpulseShield, Notification, Notifier};
use crate::store::{KeyValueStore, MemoryStore, StoreError};

/// Notifier that keeps everything it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.all().pop()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}

/// Store whose every operation fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Other("store unavailable".to_string()))
    }

    fn put(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Other("store unavailable".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Other("store unavailable".to_string()))
    }
}

/// In-memory store that counts writes
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    puts: Arc<AtomicUsize>,
}

impl CountingStore {
    /// Number of successful `put` calls so far
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.put(key, value)?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

/// Builder for shields wired to in-memory collaborators
pub struct TestShieldBuilder {
    cooldown_secs: u64,
    amount: Amount,
    store: Arc<dyn KeyValueStore>,
}

impl TestShieldBuilder {
    pub fn new() -> Self {
        Self {
            cooldown_secs: 172_800,
            amount: Amount::from_dollars(500),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn with_cooldown(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Build the shield plus the notifier it reports to
    pub fn build(self) -> (ImpulseShield, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let shield = ImpulseShield::new(
            self.cooldown_secs,
            self.amount,
            self.store,
            notifier.clone(),
        );
        (shield, notifier)
    }
}

impl Default for TestShieldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let (shield, notifier) = TestShieldBuilder::new().build();
        assert_eq!(shield.state().cooldown_duration, 172_800);
        assert_eq!(shield.state().locked_amount, Amount::from_dollars(500));
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification::new("one", "1"));
        notifier.notify(Notification::new("two", "2"));

        assert_eq!(notifier.len(), 2);
        assert_eq!(notifier.last().unwrap().title, "two");
    }

    #[test]
    fn test_counting_store() {
        let store = CountingStore::default();
        let view = store.clone();
        store.put("k", "v").unwrap();
        store.put("k", "w").unwrap();

        assert_eq!(view.puts(), 2);
        assert_eq!(view.get("k").unwrap().as_deref(), Some("w"));
    }

    #[test]
    fn test_failing_store() {
        assert!(FailingStore.get("k").is_err());
        assert!(FailingStore.put("k", "v").is_err());
    }
}
