//! Error types.

use crate::cache::StoreError;

/// Errors surfaced by the memoization engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No operation is registered under the requested identity.
    #[error("operation '{0}' is not registered")]
    UnknownOperation(String),

    /// The store rejected an explicit invalidation request.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A serialized payload read back from the store is unusable.
    #[error("failed to decode cached payload at '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The underlying computation failed. Nothing was cached.
    #[error("computation failed: {0}")]
    Compute(#[source] anyhow::Error),

    /// Invalid process settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
