use crate::events::{EventBus, ShellEvent};
use crate::CoreError;
use pinshell_manifest::{best_icon, is_within_scope, process, AppId, NormalizedManifest};
use pinshell_store::{AppRecord, AppStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};
use url::Url;

/// An installed (pinned) web app: the persisted raw inputs plus the
/// normalized manifest derived from them.
#[derive(Debug, Clone)]
pub struct App {
    pub id: AppId,
    pub manifest_url: Url,
    pub document_url: Url,
    pub raw_manifest: Value,
    pub manifest: NormalizedManifest,
}

impl App {
    /// Derive an app from its pin inputs. The manifest itself is processed
    /// with per-field fallbacks and cannot fail; only unusable retrieval
    /// URLs reject the app.
    pub fn derive(
        manifest_url: &str,
        document_url: &str,
        raw_manifest: Value,
    ) -> Result<Self, CoreError> {
        let manifest_url = Url::parse(manifest_url)
            .map_err(|e| CoreError::InvalidManifest(format!("manifest URL: {e}")))?;
        let document_url = Url::parse(document_url)
            .map_err(|e| CoreError::InvalidManifest(format!("document URL: {e}")))?;
        let manifest = process(&raw_manifest, &manifest_url, &document_url);
        Ok(Self {
            id: manifest.app_id(),
            manifest_url,
            document_url,
            raw_manifest,
            manifest,
        })
    }

    fn from_record(record: &AppRecord) -> Result<Self, CoreError> {
        Self::derive(
            &record.manifest_url,
            &record.document_url,
            record.manifest.clone(),
        )
    }

    /// Whether a URL lies within this app's navigation scope.
    pub fn contains(&self, url: &Url) -> bool {
        is_within_scope(url, &self.manifest.scope)
    }

    /// Best icon for the given pixel size, if any eligible icon exists.
    pub fn best_icon(&self, target_size_px: u32) -> Option<&Url> {
        best_icon(&self.manifest.icons, target_size_px)
    }
}

/// Registry of pinned web apps.
///
/// Holds an in-memory id-to-app map rebuilt from the record store on every
/// [`refresh`](Self::refresh). Mutations (`pin`, `unpin`) are serialized by a
/// per-registry operation lock so two concurrent pins can never interleave
/// their persistence and refresh steps and leave a stale snapshot.
pub struct AppRegistry {
    store: AppStore,
    apps: RwLock<BTreeMap<AppId, App>>,
    op_lock: Mutex<()>,
    events: Arc<EventBus>,
}

impl AppRegistry {
    pub fn new(store: AppStore, events: Arc<EventBus>) -> Self {
        Self {
            store,
            apps: RwLock::new(BTreeMap::new()),
            op_lock: Mutex::new(()),
            events,
        }
    }

    /// Start the registry: load the persisted apps into memory.
    pub fn start(&self) -> Result<(), CoreError> {
        info!("starting app registry");
        self.refresh()
    }

    /// Pin a web app: derive its identity from the manifest, persist the raw
    /// pin inputs under that id, and refresh the in-memory list.
    pub fn pin(
        &self,
        manifest_url: &str,
        document_url: &str,
        raw_manifest: Value,
    ) -> Result<App, CoreError> {
        let guard = self.op_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let app = App::derive(manifest_url, document_url, raw_manifest)?;
        let id = app.id.clone();

        let record = AppRecord::new(
            id.clone(),
            app.manifest_url.as_str().to_owned(),
            app.document_url.as_str().to_owned(),
            app.raw_manifest.clone(),
        );
        let persisted = self
            .store
            .create(&record)
            .and_then(|()| self.refresh_in_memory());
        if let Err(source) = persisted {
            return Err(CoreError::PinAppFailed { id, source });
        }

        // Handlers may re-enter the registry, so the op lock must be gone
        // before the event goes out.
        drop(guard);
        info!("pinned app {id}");
        self.events.publish(&ShellEvent::AppPinned { id });
        Ok(app)
    }

    /// Re-pin an app whose manifest changed: derive the app the same way as
    /// [`pin`](Self::pin) but overwrite any existing record for the id.
    pub fn repin(
        &self,
        manifest_url: &str,
        document_url: &str,
        raw_manifest: Value,
    ) -> Result<App, CoreError> {
        let guard = self.op_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let app = App::derive(manifest_url, document_url, raw_manifest)?;
        let id = app.id.clone();

        let record = AppRecord::new(
            id.clone(),
            app.manifest_url.as_str().to_owned(),
            app.document_url.as_str().to_owned(),
            app.raw_manifest.clone(),
        );
        let persisted = self
            .store
            .put(&record)
            .and_then(|()| self.refresh_in_memory());
        if let Err(source) = persisted {
            return Err(CoreError::PinAppFailed { id, source });
        }

        drop(guard);
        info!("re-pinned app {id}");
        self.events.publish(&ShellEvent::AppPinned { id });
        Ok(app)
    }

    /// Unpin the app with the given id, removing its persisted record.
    pub fn unpin(&self, id: &AppId) -> Result<(), CoreError> {
        let guard = self.op_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let removed = self
            .store
            .remove(id)
            .and_then(|()| self.refresh_in_memory());
        if let Err(source) = removed {
            return Err(CoreError::UnpinAppFailed {
                id: id.clone(),
                source,
            });
        }

        drop(guard);
        info!("unpinned app {id}");
        self.events
            .publish(&ShellEvent::AppUnpinned { id: id.clone() });
        Ok(())
    }

    /// Rebuild the in-memory app map from the store, re-running manifest
    /// normalization on every record. A record that fails to derive is
    /// logged and skipped; it never aborts the whole refresh.
    pub fn refresh(&self) -> Result<(), CoreError> {
        let _guard = self.op_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.refresh_in_memory()?;
        Ok(())
    }

    fn refresh_in_memory(&self) -> Result<(), pinshell_store::StoreError> {
        let records = self.store.list()?;
        let mut apps = BTreeMap::new();
        for record in &records {
            match App::from_record(record) {
                Ok(app) => {
                    apps.insert(record.id.clone(), app);
                }
                Err(e) => {
                    warn!("skipping app '{}': {e}", record.id);
                }
            }
        }
        debug!("registry refreshed with {} apps", apps.len());
        let mut map = self.apps.write().unwrap_or_else(PoisonError::into_inner);
        *map = apps;
        Ok(())
    }

    /// Find the pinned app whose navigation scope contains `url`.
    ///
    /// The most specific match wins: the app with the longest scope path.
    /// Equal-length scopes tie-break on first found in iteration order,
    /// which here is deterministic (apps are kept ordered by id).
    pub fn match_url(&self, url: &Url) -> Option<App> {
        let apps = self.apps.read().unwrap_or_else(PoisonError::into_inner);
        let mut closest: Option<&App> = None;
        for app in apps.values() {
            if !app.contains(url) {
                continue;
            }
            let longer = closest.is_none_or(|best| {
                app.manifest.scope.path().len() > best.manifest.scope.path().len()
            });
            if longer {
                closest = Some(app);
            }
        }
        closest.cloned()
    }

    /// Snapshot of installed apps as of the last successful refresh.
    pub fn list(&self) -> Vec<App> {
        let apps = self.apps.read().unwrap_or_else(PoisonError::into_inner);
        apps.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinshell_store::StoreLayout;
    use serde_json::json;

    fn registry() -> (tempfile::TempDir, AppRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        let registry = AppRegistry::new(AppStore::new(layout), Arc::new(EventBus::new()));
        registry.start().unwrap();
        (dir, registry)
    }

    fn pin(registry: &AppRegistry, start_url: &str, scope: &str) -> App {
        registry
            .pin(
                &format!("https://x.test{start_url}manifest.json"),
                &format!("https://x.test{start_url}"),
                json!({"start_url": start_url, "scope": scope}),
            )
            .unwrap()
    }

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn pin_assigns_identity_from_manifest() {
        let (_dir, registry) = registry();
        let app = pin(&registry, "/app/", "/app/");
        assert_eq!(app.id, "https://x.test/app/");
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn pin_with_invalid_urls_is_invalid_manifest() {
        let (_dir, registry) = registry();
        let err = registry
            .pin("not a url", "https://x.test/", json!({}))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidManifest(_)));
    }

    #[test]
    fn double_pin_fails_as_pin_app_failed() {
        let (_dir, registry) = registry();
        pin(&registry, "/app/", "/app/");
        let err = registry
            .pin(
                "https://x.test/app/manifest.json",
                "https://x.test/app/",
                json!({"start_url": "/app/"}),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::PinAppFailed { .. }));
    }

    #[test]
    fn repin_overwrites_an_existing_app() {
        let (_dir, registry) = registry();
        pin(&registry, "/app/", "/app/");

        let app = registry
            .repin(
                "https://x.test/app/manifest.json",
                "https://x.test/app/",
                json!({"name": "Renamed", "start_url": "/app/", "scope": "/app/"}),
            )
            .unwrap();
        assert_eq!(app.manifest.name.as_deref(), Some("Renamed"));

        let apps = registry.list();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].manifest.name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn unpin_removes_app() {
        let (_dir, registry) = registry();
        let app = pin(&registry, "/app/", "/app/");
        registry.unpin(&app.id).unwrap();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn unpin_unknown_id_fails() {
        let (_dir, registry) = registry();
        let err = registry
            .unpin(&AppId::new("https://x.test/ghost/"))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnpinAppFailed { .. }));
    }

    #[test]
    fn match_url_picks_longest_scope() {
        let (_dir, registry) = registry();
        pin(&registry, "/", "/");
        pin(&registry, "/blog/", "/blog/");

        let matched = registry.match_url(&u("https://x.test/blog/post")).unwrap();
        assert_eq!(matched.id, "https://x.test/blog/");

        let matched = registry.match_url(&u("https://x.test/other")).unwrap();
        assert_eq!(matched.id, "https://x.test/");
    }

    #[test]
    fn match_url_returns_none_outside_all_scopes() {
        let (_dir, registry) = registry();
        pin(&registry, "/app/", "/app/");
        assert!(registry.match_url(&u("https://other.test/app/")).is_none());
        assert!(registry.match_url(&u("https://x.test/elsewhere")).is_none());
    }

    #[test]
    fn refresh_rederives_normalization_from_raw_inputs() {
        let (dir, registry) = registry();
        pin(&registry, "/app/", "/app/");
        drop(registry);

        // A fresh registry over the same store rebuilds apps from raw records.
        let layout = StoreLayout::new(dir.path());
        let registry = AppRegistry::new(AppStore::new(layout), Arc::new(EventBus::new()));
        registry.start().unwrap();
        let apps = registry.list();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].manifest.scope.as_str(), "https://x.test/app/");
    }

    #[test]
    fn refresh_skips_records_with_unusable_urls() {
        let (dir, registry) = registry();
        pin(&registry, "/app/", "/app/");

        // Plant a record whose URLs no longer parse.
        let layout = StoreLayout::new(dir.path());
        let store = AppStore::new(layout);
        let bad = AppRecord::new(
            AppId::new("https://x.test/bad/"),
            "not a url".to_owned(),
            "also not".to_owned(),
            json!({}),
        );
        store.create(&bad).unwrap();

        registry.refresh().unwrap();
        let apps = registry.list();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].id, "https://x.test/app/");
    }

    #[test]
    fn pin_and_unpin_emit_events() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();

        let events = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        let registry = AppRegistry::new(AppStore::new(layout), Arc::clone(&events));
        registry.start().unwrap();
        let app = pin(&registry, "/app/", "/app/");
        registry.unpin(&app.id).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[
                ShellEvent::AppPinned {
                    id: app.id.clone()
                },
                ShellEvent::AppUnpinned { id: app.id.clone() },
            ]
        );
    }

    #[test]
    fn subscriber_may_reenter_the_registry() {
        // The UI refreshes its own view of the registry when notified, so
        // handlers run with no registry lock held.
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();

        let events = Arc::new(EventBus::new());
        let registry = Arc::new(AppRegistry::new(
            AppStore::new(layout),
            Arc::clone(&events),
        ));
        registry.start().unwrap();

        let observer = Arc::clone(&registry);
        let counts = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&counts);
        events.subscribe(move |event| {
            if matches!(
                event,
                ShellEvent::AppPinned { .. } | ShellEvent::AppUnpinned { .. }
            ) {
                observer.refresh().unwrap();
                sink.lock().unwrap().push(observer.list().len());
            }
        });

        let app = pin(&registry, "/app/", "/app/");
        registry.unpin(&app.id).unwrap();

        assert_eq!(counts.lock().unwrap().as_slice(), &[1, 0]);
    }
}
