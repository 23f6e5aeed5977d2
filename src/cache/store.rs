//! Store collaborator.
//!
//! The engine never owns cached data itself; it talks to a key-value store
//! through this trait. Values are JSON so both structured results and tag
//! registry lists fit in one keyspace.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

/// Error reported by a store backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("store {op} failed for '{key}': {reason}")]
pub struct StoreError {
    pub op: &'static str,
    pub key: String,
    pub reason: String,
}

impl StoreError {
    pub fn new(op: &'static str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            op,
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Key-value store consumed by the memoization engine.
///
/// Calls are synchronous and non-cancelable from the engine's point of view.
/// Timeouts, eviction and consistency are the backend's business.
pub trait Store: Send + Sync {
    /// Read a value. `Ok(None)` means absent.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write a value. `ttl = None` means the entry does not expire.
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Delete a value. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}
