//! Persisted key-value state: unit preferences and the last searched location.
//!
//! Values are stored as JSON strings under fixed keys, so a corrupt or
//! outdated entry only ever affects the one value that fails to parse.

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use crate::{error::StoreError, model::SelectedLocation};

pub const UNIT_SETTINGS_KEY: &str = "unitSettings";
pub const LAST_LOCATION_KEY: &str = "lastSearchedLocation";

pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Read and decode a JSON value. Anything that does not decode counts as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring unreadable persisted value");
            None
        }
    }
}

pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    store.set(key, raw)
}

pub fn load_last_location(store: &dyn KeyValueStore) -> Option<SelectedLocation> {
    load_json(store, LAST_LOCATION_KEY)
}

pub fn save_last_location(
    store: &dyn KeyValueStore,
    location: &SelectedLocation,
) -> Result<(), StoreError> {
    save_json(store, LAST_LOCATION_KEY, location)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries.lock().insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// A flat TOML table on disk. Every `set` rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store, starting empty if the file does not exist yet.
    ///
    /// A file that is not valid TOML is treated like a missing one; the next
    /// `set` overwrites it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "ignoring unreadable state file"
                );
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { path: self.path.display().to_string(), source };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents =
            toml::to_string_pretty(entries).map_err(|e| StoreError::Serialize(e.to_string()))?;
        fs::write(&self.path, contents).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.write(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a"), None);

        store.set("a", "1".into()).unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn last_location_survives_file_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let location = SelectedLocation {
            latitude: 51.5,
            longitude: -0.12,
            name: "London, UK".into(),
        };

        {
            let store = FileStore::open(&path).unwrap();
            assert!(load_last_location(&store).is_none());
            save_last_location(&store, &location).unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(load_last_location(&reopened), Some(location));
    }

    #[test]
    fn unreadable_value_is_absent() {
        let store = MemoryStore::new().with_entry(LAST_LOCATION_KEY, "{not json");
        assert!(load_last_location(&store).is_none());
    }

    #[test]
    fn truncated_state_file_falls_back_to_defaults() {
        use crate::{prefs::UnitPreferences, units::UnitSettings};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        fs::write(&path, r#"unitSettings = "{\"temperature\":\"F\""#).unwrap();

        let store = Arc::new(FileStore::open(&path).unwrap());
        assert!(load_last_location(store.as_ref()).is_none());
        assert_eq!(UnitPreferences::load(store.clone()).get(), UnitSettings::default());

        store.set(UNIT_SETTINGS_KEY, "{}".into()).unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(UNIT_SETTINGS_KEY).as_deref(), Some("{}"));
    }

    #[test]
    fn failed_write_leaves_entries_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let store = FileStore::open(blocker.join("state.toml")).unwrap();
        assert!(store.set(UNIT_SETTINGS_KEY, "{}".into()).is_err());
        assert_eq!(store.get(UNIT_SETTINGS_KEY), None);
    }
}
