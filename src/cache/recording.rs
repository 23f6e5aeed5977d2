//! Store decorator that records every operation in call order.

use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use super::{Store, StoreError};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Get { key: String },
    Set { key: String, value: Value, ttl: Option<Duration> },
    Delete { key: String },
}

impl StoreOp {
    /// Key the operation touched.
    pub fn key(&self) -> &str {
        match self {
            Self::Get { key } | Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }

    /// Short operation name: `get`, `set` or `delete`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::Set { .. } => "set",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Wraps another [`Store`] and logs each call before forwarding it.
///
/// Useful to observe exactly what the engine does for a call, in order.
pub struct RecordingStore<S> {
    inner: S,
    ops: Mutex<Vec<StoreOp>>,
}

impl<S: Store> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            ops: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of recorded operations.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.ops.lock().clone()
    }

    /// Keys passed to `delete`, in order.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, StoreOp::Delete { .. }))
            .map(|op| op.key().to_string())
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.ops.lock().clear();
    }

    /// Access the wrapped store without recording.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Store> Store for RecordingStore<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.ops.lock().push(StoreOp::Get {
            key: key.to_string(),
        });
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.ops.lock().push(StoreOp::Set {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        });
        self.inner.set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.ops.lock().push(StoreOp::Delete {
            key: key.to_string(),
        });
        self.inner.delete(key)
    }
}
