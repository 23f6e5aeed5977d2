//! Memoization engine - turns declared operations into cache reads.
//!
//! One call walks these steps in order:
//!
//! 1. No config on the operation: run the computation, touch nothing.
//! 2. Delete every key listed in `invalidates` (best effort).
//! 3. Resolve the primary key (template, or auto key when absent).
//! 4. Read it. A present value is decoded and returned.
//! 5. On a miss, run the computation.
//! 6. Store the result under the primary key with the configured TTL.
//! 7. Register the primary key under every configured tag.
//!
//! Store failures never fail a call: a failed read is a miss, failed writes
//! and deletes are logged. Two callers missing on the same key at once
//! both compute and both write; the last write wins.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{CacheConfig, KeyResolver, Operation, Store, TagRegistry};
use crate::config::Settings;
use crate::error::{Error, Result};

/// The cache interceptor.
///
/// Cheap to clone; clones share the store, the template cache and the tag
/// registry.
#[derive(Clone)]
pub struct Memoizer {
    store: Arc<dyn Store>,
    resolver: KeyResolver,
    tags: TagRegistry,
}

impl Memoizer {
    /// Create an engine over `store` with default settings.
    pub fn new(store: impl Store + 'static) -> Self {
        let store: Arc<dyn Store> = Arc::new(store);
        Self::from_parts(Arc::clone(&store), KeyResolver::new(), TagRegistry::new(store))
    }

    /// Create an engine over `store` honouring `settings`.
    pub fn with_settings(store: impl Store + 'static, settings: &Settings) -> Self {
        let store: Arc<dyn Store> = Arc::new(store);
        let tags = TagRegistry::with_prefix(Arc::clone(&store), settings.tag_prefix.as_str());
        Self::from_parts(store, KeyResolver::new(), tags)
    }

    /// Assemble an engine from explicit components, e.g. to share one
    /// template cache between several engines.
    pub fn from_parts(store: Arc<dyn Store>, resolver: KeyResolver, tags: TagRegistry) -> Self {
        info!("Memoizer initialized");
        Self {
            store,
            resolver,
            tags,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// Primary key an invocation would use, or `None` for an uncached
    /// operation.
    pub fn resolve_key(&self, op: &Operation, args: &[Value]) -> Option<String> {
        op.config()
            .map(|config| self.resolve(config.key.as_deref(), op, args))
    }

    /// Run `compute` through the cache.
    ///
    /// # Errors
    /// - [`Error::Compute`] if `compute` fails on a miss. Nothing is stored.
    /// - [`Error::Decode`] if a serialized payload read back is corrupt.
    pub fn call<T, F>(&self, op: &Operation, args: &[Value], compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> anyhow::Result<T>,
    {
        let Some(config) = op.config() else {
            return compute().map_err(Error::Compute);
        };

        let key = self.prepare(op, config, args);
        if let Some(hit) = self.lookup(&key, config)? {
            return Ok(hit);
        }

        let result = compute().map_err(Error::Compute)?;
        self.remember(op, config, args, &key, &result);
        Ok(result)
    }

    /// Async flavour of [`call`](Self::call).
    ///
    /// Only the computation is awaited; store calls run in place.
    pub async fn call_async<T, F, Fut>(
        &self,
        op: &Operation,
        args: &[Value],
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let Some(config) = op.config() else {
            return compute().await.map_err(Error::Compute);
        };

        let key = self.prepare(op, config, args);
        if let Some(hit) = self.lookup(&key, config)? {
            return Ok(hit);
        }

        let result = compute().await.map_err(Error::Compute)?;
        self.remember(op, config, args, &key, &result);
        Ok(result)
    }

    /// Delete one cache key.
    pub fn invalidate_key(&self, key: &str) -> Result<()> {
        self.store.delete(key)?;
        debug!("Invalidated key '{}'", key);
        Ok(())
    }

    /// Delete several cache keys in order.
    ///
    /// Every delete is attempted; the first failure is returned.
    pub fn invalidate_keys<I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut first_error = None;

        for key in keys {
            if let Err(e) = self.invalidate_key(key.as_ref()) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Cascade-invalidate a tag: its keys in order, then its registry entry.
    ///
    /// Returns the number of cache keys covered.
    pub fn invalidate_tag(&self, tag: &str) -> Result<usize> {
        Ok(self.tags.invalidate_tag(tag)?)
    }

    fn resolve(&self, template: Option<&str>, op: &Operation, args: &[Value]) -> String {
        self.resolver.resolve(template, op.identity(), op.params(), args)
    }

    /// Steps 2 and 3: pre-call invalidations, then the primary key.
    fn prepare(&self, op: &Operation, config: &CacheConfig, args: &[Value]) -> String {
        for template in &config.invalidates {
            let key = self.resolve(Some(template.as_str()), op, args);
            match self.store.delete(&key) {
                Ok(()) => debug!(operation = op.identity(), key = %key, "invalidated"),
                Err(e) => warn!(
                    operation = op.identity(),
                    key = %key,
                    error = %e,
                    "Failed to invalidate key, continuing"
                ),
            }
        }

        self.resolve(config.key.as_deref(), op, args)
    }

    /// Step 4: read and decode the primary key.
    fn lookup<T: DeserializeOwned>(&self, key: &str, config: &CacheConfig) -> Result<Option<T>> {
        let cached = match self.store.get(key) {
            Ok(Some(value)) if !value.is_null() => value,
            Ok(_) => {
                debug!(key, outcome = "miss", "cache lookup");
                return Ok(None);
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return Ok(None);
            }
        };

        if config.serialize {
            let decoded = serde_json::from_value::<String>(cached)
                .and_then(|payload| serde_json::from_str::<T>(&payload))
                .map_err(|source| Error::Decode {
                    key: key.to_string(),
                    source,
                })?;
            debug!(key, outcome = "hit", "cache lookup");
            return Ok(Some(decoded));
        }

        match serde_json::from_value::<T>(cached) {
            Ok(value) => {
                debug!(key, outcome = "hit", "cache lookup");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape, recomputing");
                Ok(None)
            }
        }
    }

    /// Steps 6 and 7: store the result and register its tags.
    fn remember<T: Serialize>(
        &self,
        op: &Operation,
        config: &CacheConfig,
        args: &[Value],
        key: &str,
        result: &T,
    ) {
        let encoded = if config.serialize {
            serde_json::to_string(result).map(Value::String)
        } else {
            serde_json::to_value(result)
        };

        let value = match encoded {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Result cannot be encoded, returning it uncached");
                return;
            }
        };

        match self.store.set(key, value, config.ttl) {
            Ok(()) => debug!(key, ttl = ?config.ttl, "stored result"),
            Err(e) => warn!(key, error = %e, "Failed to store result"),
        }

        for template in &config.tags {
            let tag = self.resolve(Some(template.as_str()), op, args);
            if let Err(e) = self.tags.add_key_to_tag(&tag, key) {
                warn!(key, tag = %tag, error = %e, "Failed to register tag");
            }
        }
    }
}

impl std::fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer")
            .field("templates", &self.resolver.templates().len())
            .field("tags", &self.tags)
            .finish()
    }
}
