//! Operation declarations - the dispatch boundary.
//!
//! The host declares each cacheable operation once: its identity, its
//! parameter names in declaration order, and its cache config (or none).
//! The engine receives the resolved declaration per call and never looks
//! anything up by name on the hot path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::CacheConfig;
use crate::error::{Error, Result};

/// A declared operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    identity: String,
    params: Vec<String>,
    config: Option<CacheConfig>,
}

impl Operation {
    /// Declare an uncached operation.
    ///
    /// `identity` should be unique per operation (e.g. `UserService::get_user`);
    /// it seeds auto-generated keys.
    pub fn new<I, P>(identity: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            identity: identity.into(),
            params: params.into_iter().map(Into::into).collect(),
            config: None,
        }
    }

    /// Attach a cache config (builder pattern).
    #[must_use]
    pub fn cached(mut self, config: CacheConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn config(&self) -> Option<&CacheConfig> {
        self.config.as_ref()
    }
}

/// Declared operations by identity.
///
/// Resolve an operation once and keep the `Arc`; lookups by name are for
/// wiring code, not per call.
#[derive(Clone, Default)]
pub struct OperationTable {
    operations: Arc<RwLock<HashMap<String, Arc<Operation>>>>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation, replacing any previous declaration with the
    /// same identity.
    pub fn register(&self, operation: Operation) -> Arc<Operation> {
        let operation = Arc::new(operation);
        debug!("Registering operation: {}", operation.identity());

        self.operations
            .write()
            .insert(operation.identity().to_string(), Arc::clone(&operation));

        operation
    }

    /// Get a declared operation.
    ///
    /// # Errors
    /// Returns [`Error::UnknownOperation`] if nothing is registered under
    /// `identity`.
    pub fn get(&self, identity: &str) -> Result<Arc<Operation>> {
        self.operations
            .read()
            .get(identity)
            .cloned()
            .ok_or_else(|| Error::UnknownOperation(identity.to_string()))
    }

    /// Check if an operation is declared.
    pub fn contains(&self, identity: &str) -> bool {
        self.operations.read().contains_key(identity)
    }

    /// Get the number of declared operations.
    pub fn len(&self) -> usize {
        self.operations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operations = self.operations.read();
        f.debug_struct("OperationTable")
            .field("operation_count", &operations.len())
            .field("identities", &operations.keys().collect::<Vec<_>>())
            .finish()
    }
}
