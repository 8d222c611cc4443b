//! Persistent monitoring status.
//!
//! A small JSON file records whether monitoring is active and the most
//! recent alert, so status survives process restarts and other tools can
//! poll it.

use crate::error::Result;
use crate::pipeline::types::AlertEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusFile {
    pub monitoring: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_alert: Option<AlertEvent>,
}

impl Default for StatusFile {
    fn default() -> Self {
        Self {
            monitoring: false,
            updated_at: Utc::now(),
            last_alert: None,
        }
    }
}

impl StatusFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads the record, falling back to defaults when the file is missing
    /// or unreadable. A corrupt status file must never block monitoring.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Writes atomically: serialize to a sibling temp file, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Thread-safe writer for the status file.
///
/// Stateless besides the path; each update is load-modify-save so writers
/// on different threads cannot clobber each other's fields.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: Option<PathBuf>,
}

impl StatusStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// A store that persists nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Current record, defaulting when persistence is disabled or unreadable.
    pub fn current(&self) -> StatusFile {
        match &self.path {
            Some(path) => StatusFile::load_or_default(path),
            None => StatusFile::default(),
        }
    }

    pub fn set_monitoring(&self, monitoring: bool) -> Result<()> {
        self.update(|status| status.monitoring = monitoring)
    }

    pub fn record_alert(&self, alert: &AlertEvent) -> Result<()> {
        self.update(|status| status.last_alert = Some(alert.clone()))
    }

    fn update(&self, apply: impl FnOnce(&mut StatusFile)) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut status = StatusFile::load_or_default(path);
        apply(&mut status);
        status.updated_at = Utc::now();
        status.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;

    fn store_in(dir: &tempfile::TempDir) -> StatusStore {
        StatusStore::new(Some(dir.path().join("status.json")))
    }

    fn sample_alert() -> AlertEvent {
        AlertEvent::new(
            Classification {
                is_suspicious: true,
                confidence: 0.88,
                reasoning: "test alert".to_string(),
                timestamp: Utc::now(),
            },
            300,
        )
    }

    #[test]
    fn test_missing_file_defaults_to_not_monitoring() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.current().monitoring);
    }

    #[test]
    fn test_set_monitoring_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set_monitoring(true).unwrap();
        assert!(store.current().monitoring);

        store.set_monitoring(false).unwrap();
        assert!(!store.current().monitoring);
    }

    #[test]
    fn test_record_alert_keeps_monitoring_flag() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set_monitoring(true).unwrap();
        store.record_alert(&sample_alert()).unwrap();

        let status = store.current();
        assert!(status.monitoring, "alert write must not clear the flag");
        let alert = status.last_alert.expect("alert should persist");
        assert!((alert.classification.confidence - 0.88).abs() < f32::EPSILON);
    }

    #[test]
    fn test_status_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");

        StatusStore::new(Some(path.clone()))
            .set_monitoring(true)
            .unwrap();

        // A fresh store (fresh process) sees the persisted state
        let reloaded = StatusStore::new(Some(path));
        assert!(reloaded.current().monitoring);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        fs::write(&path, "{not json").unwrap();

        let status = StatusFile::load_or_default(&path);
        assert!(!status.monitoring);

        // And the store can still write over it
        let store = StatusStore::new(Some(path));
        store.set_monitoring(true).unwrap();
        assert!(store.current().monitoring);
    }

    #[test]
    fn test_disabled_store_is_a_noop() {
        let store = StatusStore::disabled();
        assert!(!store.is_enabled());
        store.set_monitoring(true).unwrap();
        assert!(!store.current().monitoring);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/status.json");

        StatusFile::default().save(&path).unwrap();
        assert!(path.exists());
    }
}
