//! Mnemosyne - declarative memoization.
//!
//! Operations declare how they are cached (key template, TTL, tags, keys
//! they invalidate) and the engine turns repeated calls into store reads,
//! falling through to the real computation on a miss.
//!
//! ## Modules
//!
//! - `cache` - key resolution, tag registry, the memoization engine, stores
//! - `config` - environment settings
//! - `error` - error types
//! - `utils` - small parsing helpers

pub mod cache;
pub mod config;
pub mod error;
pub mod utils;

pub use cache::{
    CacheConfig, KeyResolver, Memoizer, MemoryStore, Operation, OperationTable, RecordingStore,
    Store, StoreConfig, StoreError, StoreOp, TagRegistry, TemplateCache,
};
pub use config::Settings;
pub use error::{Error, Result};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build an argument list for [`Memoizer::call`] from serializable values.
///
/// ```rust
/// let args = mnemosyne::args![42, "active"];
/// assert_eq!(args[1], "active");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::__serde_json::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::__serde_json::json!($arg)),+]
    };
}
