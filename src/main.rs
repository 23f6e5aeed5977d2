//! Mnemosyne demo.
//!
//! Walks a small user directory through the engine and logs what the store
//! sees: misses, hits, explicit invalidation and a tag cascade.
//!
//! ## Environment
//!
//! - `RUST_LOG` / `MNEMOSYNE_LOG` - log filter
//! - `MNEMOSYNE_TAG_PREFIX`, `MNEMOSYNE_STORE_CAPACITY`, `MNEMOSYNE_STORE_TTI`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mnemosyne::{
    CacheConfig, MemoryStore, Memoizer, Operation, OperationTable, RecordingStore, Settings, args,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
    version: u64,
}

/// Toy service whose lookups are "expensive" and counted.
struct UserDirectory {
    memo: Memoizer,
    get_user_op: Arc<Operation>,
    rename_user_op: Arc<Operation>,
    lookups: AtomicU64,
}

impl UserDirectory {
    fn new(memo: Memoizer, operations: &OperationTable) -> anyhow::Result<Self> {
        Ok(Self {
            memo,
            get_user_op: operations.get("UserDirectory::get_user")?,
            rename_user_op: operations.get("UserDirectory::rename_user")?,
            lookups: AtomicU64::new(0),
        })
    }

    async fn get_user(&self, id: i64) -> mnemosyne::Result<User> {
        self.memo
            .call_async(&self.get_user_op, &args![id], move || async move {
                let version = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(User {
                    id,
                    name: format!("user-{id}"),
                    version,
                })
            })
            .await
    }

    fn rename_user(&self, id: i64, name: &str) -> mnemosyne::Result<()> {
        self.memo.call(&self.rename_user_op, &args![id, name], || {
            info!("Renaming user {} to {}", id, name);
            Ok(())
        })
    }
}

fn declare_operations() -> OperationTable {
    let operations = OperationTable::new();

    operations.register(
        Operation::new("UserDirectory::get_user", ["id"]).cached(
            CacheConfig::new()
                .key("user:{id}")
                .ttl(Duration::from_secs(3600))
                .tag("users")
                .tag("user-{id}"),
        ),
    );
    operations.register(
        Operation::new("UserDirectory::rename_user", ["id", "name"])
            .cached(CacheConfig::new().invalidates("user:{id}")),
    );

    operations
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    // RUST_LOG wins over MNEMOSYNE_LOG
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Mnemosyne demo...");
    info!("Tag prefix: {:?}", settings.tag_prefix);

    let store = Arc::new(RecordingStore::new(MemoryStore::new(settings.store_config())));
    let memo = Memoizer::with_settings(Arc::clone(&store), &settings);
    let directory = UserDirectory::new(memo.clone(), &declare_operations())?;

    let first = directory.get_user(42).await?;
    let again = directory.get_user(42).await?;
    info!("get_user(42) -> {:?}, then {:?}", first, again);

    directory.get_user(43).await?;

    directory.rename_user(42, "ada")?;
    let renamed = directory.get_user(42).await?;
    info!("after rename, get_user(42) -> {:?}", renamed);

    let covered = memo.invalidate_tag("users")?;
    info!("Invalidated tag 'users' ({} keys)", covered);

    directory.get_user(43).await?;

    info!(
        "Expensive lookups: {}",
        directory.lookups.load(Ordering::SeqCst)
    );
    for (i, op) in store.operations().iter().enumerate() {
        info!("{:>2}. {:<6} {}", i + 1, op.name().to_uppercase(), op.key());
    }

    Ok(())
}
