use crate::layout::StoreLayout;
use crate::{fsync_dir, StoreError};
use pinshell_manifest::AppId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Persisted record of a pinned web app.
///
/// Deliberately stores only the raw pin inputs (manifest URL, document URL,
/// raw manifest JSON). Normalization is recomputed on every registry
/// refresh, so changes to the processing algorithm transparently
/// re-normalize existing apps on next load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppRecord {
    pub id: AppId,
    pub manifest_url: String,
    pub document_url: String,
    pub manifest: Value,
    pub created_at: String,
    pub updated_at: String,
    /// blake3 checksum for integrity verification. `None` for legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl AppRecord {
    pub fn new(id: AppId, manifest_url: String, document_url: String, manifest: Value) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            manifest_url,
            document_url,
            manifest,
            created_at: now.clone(),
            updated_at: now,
            checksum: None,
        }
    }

    /// Compute the checksum over the record content (excluding the checksum field itself).
    fn compute_checksum(&self) -> Result<String, StoreError> {
        let mut copy = self.clone();
        copy.checksum = None;
        let json = serde_json::to_string_pretty(&copy)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// CRUD store for pinned app records, one JSON file per app.
///
/// App ids are URLs and therefore not filename-safe; files are named by the
/// blake3 hash of the id, with the id itself carried inside the record.
pub struct AppStore {
    layout: StoreLayout,
}

impl AppStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    fn record_path(&self, id: &AppId) -> PathBuf {
        let name = blake3::hash(id.as_str().as_bytes()).to_hex().to_string();
        self.layout.apps_dir().join(name)
    }

    /// Persist a new app record. Fails with [`StoreError::AppExists`] when a
    /// record with the same id is already pinned.
    pub fn create(&self, record: &AppRecord) -> Result<(), StoreError> {
        let dest = self.record_path(&record.id);
        if dest.exists() {
            return Err(StoreError::AppExists(record.id.to_string()));
        }
        self.write_record(record, &dest)
    }

    /// Overwrite an app record unconditionally, refreshing `updated_at`.
    pub fn put(&self, record: &AppRecord) -> Result<(), StoreError> {
        let mut record = record.clone();
        record.updated_at = chrono::Utc::now().to_rfc3339();
        let dest = self.record_path(&record.id);
        self.write_record(&record, &dest)
    }

    fn write_record(&self, record: &AppRecord, dest: &std::path::Path) -> Result<(), StoreError> {
        let mut with_checksum = record.clone();
        with_checksum.checksum = Some(with_checksum.compute_checksum()?);
        let content = serde_json::to_string_pretty(&with_checksum)?;

        let dir = self.layout.apps_dir();
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;

        Ok(())
    }

    pub fn get(&self, id: &AppId) -> Result<AppRecord, StoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(StoreError::AppNotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let record: AppRecord = serde_json::from_str(&content)?;

        // Verify checksum if present (backward-compatible: legacy files have None)
        if let Some(ref expected) = record.checksum {
            let actual = record.compute_checksum()?;
            if actual != *expected {
                return Err(StoreError::IntegrityFailure {
                    key: id.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        Ok(record)
    }

    pub fn exists(&self, id: &AppId) -> bool {
        self.record_path(id).exists()
    }

    pub fn remove(&self, id: &AppId) -> Result<(), StoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(StoreError::AppNotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// List all readable app records, sorted by id. Corrupted entries are
    /// skipped with a warning so one bad record never hides the rest.
    pub fn list(&self) -> Result<Vec<AppRecord>, StoreError> {
        let dir = self.layout.apps_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_str().unwrap_or("");
            if name_str.starts_with('.') {
                continue;
            }
            match self.read_record_file(&entry.path()) {
                Ok(record) => results.push(record),
                Err(e) => {
                    tracing::warn!("skipping corrupted app record '{name_str}': {e}");
                }
            }
        }
        results.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(results)
    }

    fn read_record_file(&self, path: &std::path::Path) -> Result<AppRecord, StoreError> {
        let content = fs::read_to_string(path)?;
        let record: AppRecord = serde_json::from_str(&content)?;
        if let Some(ref expected) = record.checksum {
            let actual = record.compute_checksum()?;
            if actual != *expected {
                return Err(StoreError::IntegrityFailure {
                    key: record.id.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(record)
    }
}
