use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::units::UnitSystem;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSettings {
    pub unit_system: UnitSystem,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            unit_system: UnitSystem::Cm,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    measurement: MeasurementSettings,
}

/// JSON-file-backed user settings, shared across commands behind a lock.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn measurement(&self) -> MeasurementSettings {
        self.data.read().unwrap().measurement.clone()
    }

    pub fn update_measurement(&self, settings: MeasurementSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.measurement = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("fitform-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn defaults_to_centimeters() {
        let store = SettingsStore::new(temp_path()).unwrap();
        assert_eq!(store.measurement().unit_system, UnitSystem::Cm);
    }

    #[test]
    fn updates_persist_across_reopen() {
        let path = temp_path();
        {
            let store = SettingsStore::new(path.clone()).unwrap();
            store
                .update_measurement(MeasurementSettings {
                    unit_system: UnitSystem::Feet,
                })
                .unwrap();
        }

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.measurement().unit_system, UnitSystem::Feet);
    }

    #[test]
    fn corrupt_settings_file_falls_back_to_defaults() {
        let path = temp_path();
        fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.measurement().unit_system, UnitSystem::Cm);
    }
}
