use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    CANONICAL_FACE_SIZE, DEFAULT_ALERT_COOLDOWN_SECS, DEFAULT_MAX_DISTANCE, DEFAULT_MIN_FACE_SIZE,
};
use crate::shared::error::StoreError;

pub const DEFAULT_DETECTOR_CONFIDENCE: f64 = 0.5;

/// Persisted application settings.
///
/// Every field has a default so older or hand-written files with missing
/// keys still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root holding the face dataset, person directory and alert log.
    pub data_dir: PathBuf,
    /// Largest match distance still accepted as a known person.
    pub max_distance: f64,
    pub alert_cooldown_secs: u64,
    pub alerts_enabled: bool,
    pub detector_confidence: f64,
    pub min_face_size: u32,
    pub canonical_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_distance: DEFAULT_MAX_DISTANCE,
            alert_cooldown_secs: DEFAULT_ALERT_COOLDOWN_SECS,
            alerts_enabled: true,
            detector_confidence: DEFAULT_DETECTOR_CONFIDENCE,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            canonical_size: CANONICAL_FACE_SIZE,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("Facewatch"))
        .unwrap_or_else(|| PathBuf::from("facewatch-data"))
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Facewatch").join("settings.json"))
    }

    /// Loads the user settings file, falling back to defaults when it is
    /// absent or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Loads settings from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(StoreError::io(path))?;
        serde_json::from_str(&json).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(StoreError::io(path))
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.data_dir.join("dataset")
    }

    pub fn directory_path(&self) -> PathBuf {
        self.data_dir.join("people.json")
    }

    pub fn alert_log_path(&self) -> PathBuf {
        self.data_dir.join("alerts.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_relative_eq!(s.max_distance, 70.0);
        assert_eq!(s.alert_cooldown(), Duration::from_secs(10));
        assert!(s.alerts_enabled);
        assert_eq!(s.min_face_size, 80);
        assert_eq!(s.canonical_size, 200);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let s = Settings {
            data_dir: dir.path().to_path_buf(),
            max_distance: 42.5,
            alerts_enabled: false,
            ..Settings::default()
        };
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "max_distance": 12.0 }"#).unwrap();
        let s = Settings::load_from(&path).unwrap();
        assert_relative_eq!(s.max_distance, 12.0);
        assert_eq!(s.alert_cooldown_secs, 10);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn test_derived_paths_live_under_data_dir() {
        let s = Settings {
            data_dir: PathBuf::from("/srv/fw"),
            ..Settings::default()
        };
        assert_eq!(s.dataset_dir(), PathBuf::from("/srv/fw/dataset"));
        assert_eq!(s.directory_path(), PathBuf::from("/srv/fw/people.json"));
        assert_eq!(s.alert_log_path(), PathBuf::from("/srv/fw/alerts.log"));
    }
}
