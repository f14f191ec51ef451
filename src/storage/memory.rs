//! Process-memory backend: nothing survives a restart.

use async_trait::async_trait;

use super::{RegistryState, StorageBackend};
use crate::core::error::AppResult;

/// Keeps no durable copy at all. The registry's own in-memory state is the
/// only state; a restart starts from empty.
#[derive(Debug, Default)]
pub struct InMemoryStore;

impl InMemoryStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageBackend for InMemoryStore {
    async fn load(&self) -> AppResult<RegistryState> {
        Ok(RegistryState::default())
    }

    async fn save(&self, _state: &RegistryState) -> AppResult<()> {
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_is_always_empty() {
        let store = InMemoryStore::new();
        let mut state = store.load().await.unwrap();
        state.owner_of.insert("a@b.c".to_string(), 1);
        store.save(&state).await.unwrap();

        // A "restarted" store sees nothing.
        assert_eq!(store.load().await.unwrap(), RegistryState::default());
    }
}
