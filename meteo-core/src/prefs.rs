use std::sync::Arc;

use crate::{
    error::StoreError,
    store::{KeyValueStore, UNIT_SETTINGS_KEY, load_json, save_json},
    units::{UnitSettings, UnitSettingsPatch, UnitSystem},
};

/// The user's unit choice, backed by the persisted store.
#[derive(Debug, Clone)]
pub struct UnitPreferences {
    store: Arc<dyn KeyValueStore>,
    current: UnitSettings,
}

impl UnitPreferences {
    /// Restore the persisted settings, or the metric default if none are stored
    /// or the stored value is not a valid triple.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let current = load_json(store.as_ref(), UNIT_SETTINGS_KEY).unwrap_or_default();
        tracing::debug!(?current, "loaded unit settings");
        Self { store, current }
    }

    pub fn get(&self) -> UnitSettings {
        self.current
    }

    /// Merge `patch` into the current settings and persist the result.
    pub fn set(&mut self, patch: UnitSettingsPatch) -> Result<UnitSettings, StoreError> {
        let next = self.current.merge(patch);
        save_json(self.store.as_ref(), UNIT_SETTINGS_KEY, &next)?;
        self.current = next;
        Ok(next)
    }

    pub fn set_system(&mut self, system: UnitSystem) -> Result<UnitSettings, StoreError> {
        self.set(system.patch())
    }
}
