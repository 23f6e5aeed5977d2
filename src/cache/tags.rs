//! Tag registry - groups cache keys under labels for bulk invalidation.
//!
//! Each tag lives in the store itself under `"tag:" + name` as a JSON array
//! of cache keys. Appends are read-modify-write and not atomic: two writers
//! racing on the same tag can lose an append. Nothing gets corrupted; the
//! lost key simply survives the next cascade until its own TTL.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{Store, StoreError};

/// Prefix of tag registry entries in the store.
pub const DEFAULT_TAG_PREFIX: &str = "tag:";

/// Per-tag ordered key lists kept in the store.
#[derive(Clone)]
pub struct TagRegistry {
    store: Arc<dyn Store>,
    prefix: Arc<str>,
}

impl TagRegistry {
    /// Create a registry using the default `tag:` prefix.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_prefix(store, DEFAULT_TAG_PREFIX)
    }

    /// Create a registry with a custom entry prefix.
    pub fn with_prefix(store: Arc<dyn Store>, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Store key holding the key list of `tag`.
    pub fn registry_key(&self, tag: &str) -> String {
        format!("{}{}", self.prefix, tag)
    }

    /// Read the keys registered under `tag`, in insertion order.
    ///
    /// An absent entry is an empty list. So is an entry that is not a list
    /// of strings; that case is logged.
    pub fn keys(&self, tag: &str) -> Result<Vec<String>, StoreError> {
        let registry_key = self.registry_key(tag);
        let raw = self.store.get(&registry_key)?;
        Ok(decode_key_list(&registry_key, raw))
    }

    /// Append `key` to `tag` unless it is already present.
    ///
    /// Returns `true` if the list was written.
    pub fn add_key_to_tag(&self, tag: &str, key: &str) -> Result<bool, StoreError> {
        let registry_key = self.registry_key(tag);
        let mut keys = self.keys(tag)?;

        if keys.iter().any(|k| k == key) {
            return Ok(false);
        }

        keys.push(key.to_string());
        let list = Value::Array(keys.into_iter().map(Value::String).collect());
        self.store.set(&registry_key, list, None)?;

        debug!("Tagged '{}' with '{}'", key, tag);
        Ok(true)
    }

    /// Cascade-invalidate `tag`.
    ///
    /// Deletes every registered key in list order, then the registry entry
    /// itself. Every delete is attempted; the first failure is returned.
    /// Returns the number of cache keys the cascade covered.
    pub fn invalidate_tag(&self, tag: &str) -> Result<usize, StoreError> {
        let registry_key = self.registry_key(tag);
        let keys = self.keys(tag)?;
        let mut first_error = None;

        for key in &keys {
            if let Err(e) = self.store.delete(key) {
                warn!(tag, key = %key, error = %e, "Failed to delete tagged key");
                first_error.get_or_insert(e);
            }
        }

        if let Err(e) = self.store.delete(&registry_key) {
            warn!(tag, error = %e, "Failed to delete tag registry entry");
            first_error.get_or_insert(e);
        }

        debug!("Invalidated tag '{}' ({} keys)", tag, keys.len());

        match first_error {
            Some(e) => Err(e),
            None => Ok(keys.len()),
        }
    }
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRegistry")
            .field("prefix", &self.prefix)
            .finish()
    }
}

fn decode_key_list(registry_key: &str, raw: Option<Value>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_value::<Vec<String>>(raw) {
        Ok(keys) => keys,
        Err(e) => {
            warn!(
                registry_key,
                error = %e,
                "Tag registry entry is not a list of keys, treating as empty"
            );
            Vec::new()
        }
    }
}
