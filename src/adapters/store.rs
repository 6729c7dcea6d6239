//! ID-mapping persistence named at its interface only (§1, §6 "Persisted state layout", §4.10):
//! a pure CRUD store behind a repository façade. Out of this core's scope beyond the trait, a
//! no-op null implementation, and one minimal file-backed implementation.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use secs2::Item;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error reading/writing the mapping store: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed persisted state: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// ECID current values, enabled CEIDs, and the report/linkage tables — the fields named in §6
/// "Persisted state layout" as MAY-persist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub ecid_values: HashMap<u32, Item>,
    pub enabled_ceids: Vec<u32>,
    pub reports: HashMap<u32, Vec<u32>>,
    pub linkages: HashMap<u32, Vec<u32>>,
}

pub trait MappingStore: Send + Sync {
    fn load(&self, device_id: u16) -> Result<PersistedState, StoreError>;
    fn save(&self, device_id: u16, state: &PersistedState) -> Result<(), StoreError>;
}

/// Nothing is persisted; `load` always returns the empty default. The equipment behaves as if
/// it starts from a fresh factory image every restart.
#[derive(Default)]
pub struct NullMappingStore;

impl MappingStore for NullMappingStore {
    fn load(&self, _device_id: u16) -> Result<PersistedState, StoreError> {
        Ok(PersistedState::default())
    }

    fn save(&self, _device_id: u16, _state: &PersistedState) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A simple key-value table keyed by `{device-id, kind, id}`, realized here as one JSON file per
/// device under `directory`, named `device-<id>.json`. Enough to exercise `persist_ecids`
/// without standing up a real database.
pub struct FileMappingStore {
    directory: PathBuf,
}

impl FileMappingStore {
    pub fn new(directory: impl Into<PathBuf>) -> FileMappingStore {
        FileMappingStore {
            directory: directory.into(),
        }
    }

    fn path_for(&self, device_id: u16) -> PathBuf {
        self.directory.join(format!("device-{device_id}.json"))
    }
}

impl MappingStore for FileMappingStore {
    fn load(&self, device_id: u16) -> Result<PersistedState, StoreError> {
        let path = self.path_for(device_id);
        if !path.exists() {
            return Ok(PersistedState::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, device_id: u16, state: &PersistedState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.directory)?;
        let text = serde_json::to_string_pretty(state)?;
        fs::write(self.path_for(device_id), text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMappingStore::new(dir.path());
        let mut state = PersistedState::default();
        state.ecid_values.insert(1, Item::u4(150));
        state.enabled_ceids.push(200);
        store.save(1, &state).unwrap();
        let loaded = store.load(1).unwrap();
        assert_eq!(loaded.ecid_values.get(&1), Some(&Item::u4(150)));
        assert_eq!(loaded.enabled_ceids, vec![200]);
    }

    #[test]
    fn file_store_missing_device_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMappingStore::new(dir.path());
        let loaded = store.load(99).unwrap();
        assert!(loaded.ecid_values.is_empty());
    }

    #[test]
    fn null_store_never_persists() {
        let store = NullMappingStore;
        let mut state = PersistedState::default();
        state.enabled_ceids.push(1);
        store.save(1, &state).unwrap();
        assert!(store.load(1).unwrap().enabled_ceids.is_empty());
    }
}
