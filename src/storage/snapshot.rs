//! JSON snapshot backend: the whole state rewritten atomically per save.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs_err::tokio as fs;

use super::{RegistryState, StorageBackend};
use crate::core::error::AppResult;

/// Serializes the full `RegistryState` to a JSON file. Saves write a
/// sibling temp file and rename it over the target, so a crash mid-write
/// leaves the previous snapshot intact instead of a torn file.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl StorageBackend for SnapshotStore {
    async fn load(&self) -> AppResult<RegistryState> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No snapshot at {}, starting empty", self.path.display());
                return Ok(RegistryState::default());
            }
            Err(e) => {
                log::warn!("Failed to read snapshot {}: {}. Starting empty.", self.path.display(), e);
                return Ok(RegistryState::default());
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => Ok(state),
            Err(e) => {
                log::warn!(
                    "Snapshot {} is not valid JSON: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                Ok(RegistryState::default())
            }
        }
    }

    async fn save(&self, state: &RegistryState) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_state() -> RegistryState {
        let mut state = RegistryState::default();
        state.owner_of.insert("jane@tmp.example".to_string(), 7);
        state
            .addresses_of
            .insert(7, vec!["jane@tmp.example".to_string()]);
        state.last_address_of.insert(7, "jane@tmp.example".to_string());
        state.blocked.insert(99);
        state
    }

    #[tokio::test]
    async fn roundtrips_full_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("state.json"));

        let state = sample_state();
        store.save(&state).await.unwrap();

        // A fresh store over the same path sees the same state.
        let reopened = SnapshotStore::new(dir.path().join("state.json"));
        assert_eq!(reopened.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nothing-here.json"));
        assert_eq!(store.load().await.unwrap(), RegistryState::default());
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = SnapshotStore::new(&path);
        assert_eq!(store.load().await.unwrap(), RegistryState::default());
    }

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = SnapshotStore::new(&path);

        store.save(&sample_state()).await.unwrap();
        let mut second = sample_state();
        second.owner_of.insert("x@tmp.example".to_string(), 8);
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap(), second);
        // No temp file left behind.
        assert!(!store.tmp_path().exists());
    }
}
