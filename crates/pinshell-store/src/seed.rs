use crate::apps::{AppRecord, AppStore};
use crate::layout::StoreLayout;
use crate::settings::SettingsStore;
use crate::StoreError;
use pinshell_manifest::AppId;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Declarative first-run content for a fresh store, typically parsed from a
/// bundled `defaults.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreDefaults {
    #[serde(default)]
    pub apps: BTreeMap<String, DefaultApp>,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultApp {
    pub manifest_url: String,
    pub document_url: String,
    pub manifest: Value,
}

impl StoreDefaults {
    pub fn parse(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

/// Seed a store with default apps and settings.
///
/// Existing records are never overwritten; a default that collides with a
/// key the user already has is skipped. Safe to call on every startup.
pub fn seed_defaults(layout: &StoreLayout, defaults: &StoreDefaults) -> Result<(), StoreError> {
    layout.initialize()?;

    let apps = AppStore::new(layout.clone());
    for (id, app) in &defaults.apps {
        let id = AppId::new(id.clone());
        if apps.exists(&id) {
            continue;
        }
        let record = AppRecord::new(
            id.clone(),
            app.manifest_url.clone(),
            app.document_url.clone(),
            app.manifest.clone(),
        );
        match apps.create(&record) {
            Ok(()) => info!("seeded default app {id}"),
            Err(e) => warn!("failed to seed default app {id}: {e}"),
        }
    }

    let settings = SettingsStore::new(layout.clone());
    for (key, value) in &defaults.settings {
        match settings.create(key, value.clone()) {
            Ok(()) => info!("seeded default setting '{key}'"),
            Err(StoreError::SettingExists(_)) => {}
            Err(e) => warn!("failed to seed default setting '{key}': {e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> StoreDefaults {
        StoreDefaults::parse(
            r#"{
                "apps": {
                    "https://start.test/": {
                        "manifest_url": "https://start.test/manifest.json",
                        "document_url": "https://start.test/",
                        "manifest": {"name": "Start", "start_url": "/"}
                    }
                },
                "settings": {
                    "homepage": "https://start.test/"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn seeds_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        seed_defaults(&layout, &defaults()).unwrap();

        let apps = AppStore::new(layout.clone());
        assert_eq!(apps.list().unwrap().len(), 1);
        let settings = SettingsStore::new(layout);
        assert_eq!(
            settings.read("homepage").unwrap(),
            json!("https://start.test/")
        );
    }

    #[test]
    fn never_overwrites_user_state() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();

        let settings = SettingsStore::new(layout.clone());
        settings.update("homepage", json!("https://mine.test/")).unwrap();

        seed_defaults(&layout, &defaults()).unwrap();
        assert_eq!(
            settings.read("homepage").unwrap(),
            json!("https://mine.test/")
        );
    }

    #[test]
    fn seeding_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        seed_defaults(&layout, &defaults()).unwrap();
        seed_defaults(&layout, &defaults()).unwrap();

        let apps = AppStore::new(layout);
        assert_eq!(apps.list().unwrap().len(), 1);
    }

    #[test]
    fn empty_defaults_parse() {
        let d = StoreDefaults::parse("{}").unwrap();
        assert!(d.apps.is_empty());
        assert!(d.settings.is_empty());
    }
}
