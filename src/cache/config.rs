//! Cache configuration.

use std::time::Duration;

/// Declarative cache configuration attached to one operation.
///
/// Immutable once the operation is registered. All template strings use
/// `{name}` placeholders resolved against the operation's parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Key template for the primary cache entry.
    /// `None` means the key is derived from a hash of the call.
    pub key: Option<String>,

    /// Time-to-live for the primary entry. `None` never expires.
    pub ttl: Option<Duration>,

    /// Key templates deleted before the primary key is read.
    pub invalidates: Vec<String>,

    /// Tag-name templates the primary key is registered under.
    pub tags: Vec<String>,

    /// Encode results explicitly instead of storing the structured value.
    pub serialize: bool,
}

impl CacheConfig {
    /// Create an empty config: auto key, no expiration, no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key template (builder pattern).
    #[must_use]
    pub fn key(mut self, template: impl Into<String>) -> Self {
        self.key = Some(template.into());
        self
    }

    /// Set time-to-live for the cached result.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    /// Add a key template to delete on every call.
    #[must_use]
    pub fn invalidates(mut self, template: impl Into<String>) -> Self {
        self.invalidates.push(template.into());
        self
    }

    /// Add a tag template the result is registered under.
    #[must_use]
    pub fn tag(mut self, template: impl Into<String>) -> Self {
        self.tags.push(template.into());
        self
    }

    /// Toggle explicit encoding of stored results.
    #[must_use]
    pub fn serialize(mut self, enabled: bool) -> Self {
        self.serialize = enabled;
        self
    }
}

/// Configuration for a [`MemoryStore`](super::MemoryStore) instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of entries in the store.
    pub max_capacity: u64,

    /// Time-to-idle for entries.
    /// Entries are evicted if not accessed within this duration,
    /// regardless of their own TTL.
    pub tti: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            tti: None,
        }
    }
}

impl StoreConfig {
    /// Create a new store config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    /// Set time-to-idle for entries.
    #[must_use]
    pub fn tti(mut self, duration: Duration) -> Self {
        self.tti = Some(duration);
        self
    }
}
