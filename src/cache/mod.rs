//! Cache module - declarative memoization over a pluggable store.
//!
//! ## Architecture
//!
//! - `KeyResolver` - expands `{name}` key templates, or hashes the call
//! - `TagRegistry` - per-tag key lists kept in the store, cascade deletes
//! - `Memoizer` - runs one call: invalidate, read, compute, write, tag
//! - `Store` - the key-value backend (`MemoryStore` ships on Moka)
//!
//! ## Usage
//!
//! ```rust
//! use mnemosyne::{CacheConfig, MemoryStore, Memoizer, Operation, args};
//!
//! let memo = Memoizer::new(MemoryStore::default());
//! let get_user = Operation::new("UserService::get_user", ["id"])
//!     .cached(CacheConfig::new().key("user:{id}").tag("user"));
//!
//! let name: String = memo
//!     .call(&get_user, &args![42], || Ok("Ada".to_string()))
//!     .unwrap();
//! assert_eq!(name, "Ada");
//!
//! memo.invalidate_tag("user").unwrap();
//! ```

mod config;
mod memoizer;
mod memory;
mod operation;
mod recording;
mod store;
mod tags;
mod template;

pub use config::{CacheConfig, StoreConfig};
pub use memoizer::Memoizer;
pub use memory::MemoryStore;
pub use operation::{Operation, OperationTable};
pub use recording::{RecordingStore, StoreOp};
pub use store::{Store, StoreError};
pub use tags::{DEFAULT_TAG_PREFIX, TagRegistry};
pub use template::{KeyResolver, ParsedTemplate, TemplateCache, auto_key, scalar_text};
