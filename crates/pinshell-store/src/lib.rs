//! Record store for Pinshell: pinned web apps and shell settings.
//!
//! This crate provides the persistence layer: an `AppStore` of raw manifest
//! records keyed by app id, a `SettingsStore` of string-keyed JSON values,
//! `StoreLayout` for directory structure management, and first-run default
//! seeding. Only raw pin inputs are persisted; manifest normalization is
//! recomputed by the core on every load.

pub mod apps;
pub mod layout;
pub mod seed;
pub mod settings;

pub use apps::{AppRecord, AppStore};
pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use seed::{seed_defaults, DefaultApp, StoreDefaults};
pub use settings::SettingsStore;

use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// On Linux with ext4 `data=ordered` (the default), renames are usually
/// durable without an explicit dir fsync, but POSIX does not guarantee this.
/// Calling `fsync()` on the parent directory makes the rename durable on
/// all filesystems and mount configurations.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("app not found: {0}")]
    AppNotFound(String),
    #[error("app already pinned: {0}")]
    AppExists(String),
    #[error("setting not found: {0}")]
    SettingNotFound(String),
    #[error("setting already exists: {0}")]
    SettingExists(String),
    #[error("integrity check failed for record '{key}': expected {expected}, got {actual}")]
    IntegrityFailure {
        key: String,
        expected: String,
        actual: String,
    },
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_app_not_found() {
        let e = StoreError::AppNotFound("https://x.test/app/".to_owned());
        assert!(e.to_string().contains("https://x.test/app/"));
    }

    #[test]
    fn store_error_display_app_exists() {
        let e = StoreError::AppExists("https://x.test/app/".to_owned());
        assert!(e.to_string().contains("already pinned"));
    }

    #[test]
    fn store_error_display_version_mismatch() {
        let e = StoreError::VersionMismatch {
            expected: 1,
            found: 9,
        };
        let msg = e.to_string();
        assert!(msg.contains('1'));
        assert!(msg.contains('9'));
    }

    #[test]
    fn store_error_display_integrity_failure() {
        let e = StoreError::IntegrityFailure {
            key: "k".to_owned(),
            expected: "exp".to_owned(),
            actual: "act".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exp"));
        assert!(msg.contains("act"));
    }
}
