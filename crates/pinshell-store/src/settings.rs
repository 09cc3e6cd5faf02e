use crate::layout::StoreLayout;
use crate::{fsync_dir, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// CRUD store for shell settings: string keys mapping to arbitrary JSON
/// values, held in a single atomically-rewritten `settings.json`.
pub struct SettingsStore {
    layout: StoreLayout,
}

impl SettingsStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    fn load(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let path = self.layout.settings_file();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, settings: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(settings)?;
        let dir = self
            .layout
            .settings_file()
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_else(|| self.layout.root().to_path_buf());
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.layout.settings_file())
            .map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;
        Ok(())
    }

    /// Create a setting. Fails if the key already exists.
    pub fn create(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut settings = self.load()?;
        if settings.contains_key(key) {
            return Err(StoreError::SettingExists(key.to_owned()));
        }
        settings.insert(key.to_owned(), value);
        self.save(&settings)
    }

    pub fn read(&self, key: &str) -> Result<Value, StoreError> {
        self.load()?
            .remove(key)
            .ok_or_else(|| StoreError::SettingNotFound(key.to_owned()))
    }

    /// Set a setting, creating it if absent.
    pub fn update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut settings = self.load()?;
        settings.insert(key.to_owned(), value);
        self.save(&settings)
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut settings = self.load()?;
        if settings.remove(key).is_none() {
            return Err(StoreError::SettingNotFound(key.to_owned()));
        }
        self.save(&settings)
    }

    pub fn list(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        self.load()
    }
}
