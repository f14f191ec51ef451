//! Registry persistence: one backend contract, three implementations
//!
//! Every backend persists the same four logical structures (address to
//! owner, owner to address list, owner to last address, and the
//! block-list) as one `RegistryState` value. `load` runs once at startup; `save` runs under the
//! registry lock after every successful mutation, so backends never see
//! concurrent writes.

pub mod db;
pub mod memory;
pub mod snapshot;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config;
use crate::core::error::AppResult;

// Re-exports for convenience
pub use db::{DbConnection, DbPool, SqliteStore};
pub use memory::InMemoryStore;
pub use snapshot::SnapshotStore;

/// The full persisted registry state.
///
/// `addresses_of` keeps insertion order per owner; `owner_of` is the
/// authoritative ownership map the other two must stay consistent with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryState {
    #[serde(default)]
    pub owner_of: HashMap<String, i64>,
    #[serde(default)]
    pub addresses_of: HashMap<i64, Vec<String>>,
    #[serde(default)]
    pub last_address_of: HashMap<i64, String>,
    #[serde(default)]
    pub blocked: HashSet<i64>,
}

/// Storage contract shared by the memory, snapshot-file and SQLite backends.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Load the persisted state. Backends degrade to an empty state (with a
    /// logged warning) rather than failing startup on unreadable data.
    async fn load(&self) -> AppResult<RegistryState>;

    /// Persist the full state. Called with the registry lock held, so the
    /// state is internally consistent and writes never race.
    async fn save(&self, state: &RegistryState) -> AppResult<()>;

    /// Whether a failed save must abort the calling mutation. Lossy
    /// backends return false and the registry logs and carries on with its
    /// in-memory view; the relational backend returns true because silently
    /// dropping the ownership map is a correctness hazard.
    fn strict_writes(&self) -> bool {
        false
    }

    /// Short backend name for startup logging.
    fn describe(&self) -> &'static str;
}

/// Build the backend selected by `STORAGE_BACKEND`.
pub fn backend_from_config() -> AppResult<Arc<dyn StorageBackend>> {
    match config::STORAGE_BACKEND.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "snapshot" => Ok(Arc::new(SnapshotStore::new(config::STATE_FILE_PATH.as_str()))),
        other => {
            if other != "sqlite" {
                log::warn!("Unknown STORAGE_BACKEND '{}', falling back to sqlite", other);
            }
            Ok(Arc::new(SqliteStore::open(config::DATABASE_PATH.as_str())?))
        }
    }
}
