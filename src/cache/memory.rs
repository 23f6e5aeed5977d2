//! In-process store backed by Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use serde_json::Value;

use super::{Store, StoreConfig, StoreError};

/// Stored value plus its own time-to-live.
#[derive(Clone)]
struct Entry {
    value: Value,
    ttl: Option<Duration>,
}

/// Per-entry expiration: each write carries its own TTL.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// A [`Store`] over Moka.
///
/// This store is:
/// - Thread-safe (uses Arc internally)
/// - Bounded by `max_capacity` with optional TTI
/// - Clone-friendly (cloning is cheap, shares the same underlying cache)
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Cache<String, Entry>>,
}

impl MemoryStore {
    /// Create a new store with the given config.
    pub fn new(config: StoreConfig) -> Self {
        let mut builder = Cache::<String, Entry>::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry);

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        Self {
            inner: Arc::new(builder.build()),
        }
    }

    /// Check if a key exists in the store.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Get the number of entries in the store.
    ///
    /// Note: This may not be perfectly accurate due to pending maintenance.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.inner.get(key).map(|entry| entry.value))
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), Entry { value, ttl });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.invalidate(key);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store = MemoryStore::default();

        assert_eq!(store.get("user:42").unwrap(), None);

        store.set("user:42", json!({"id": 42}), None).unwrap();
        assert_eq!(store.get("user:42").unwrap(), Some(json!({"id": 42})));
        assert!(store.contains("user:42"));

        store.delete("user:42").unwrap();
        assert_eq!(store.get("user:42").unwrap(), None);
    }

    #[test]
    fn test_delete_absent_key_succeeds() {
        let store = MemoryStore::default();
        assert!(store.delete("missing").is_ok());
    }

    #[test]
    fn test_entry_expires_after_its_own_ttl() {
        let store = MemoryStore::default();

        store
            .set("short", json!(1), Some(Duration::from_millis(50)))
            .unwrap();
        store.set("forever", json!(2), None).unwrap();

        std::thread::sleep(Duration::from_millis(150));

        assert_eq!(store.get("short").unwrap(), None);
        assert_eq!(store.get("forever").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::default();
        let other = store.clone();

        store.set("k", json!("v"), None).unwrap();
        assert_eq!(other.get("k").unwrap(), Some(json!("v")));
        assert_eq!(other.entry_count(), 1);
    }
}
