use crate::CoreError;
use pinshell_store::SettingsStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tracing::{debug, info};

/// Setting key for the user's preferred start page, the one key consumed by
/// the shell's neighbors (new-tab view, homescreen).
pub const HOMEPAGE_KEY: &str = "homepage";

type ChangeListener = Box<dyn Fn(&Value) + Send + Sync>;

/// Broadcast channel linking every [`Settings`] instance in the process.
///
/// Replaces a browser `BroadcastChannel`: when one instance writes a
/// setting it publishes here, and every *other* instance independently
/// reloads its own cache. The writer refreshes itself explicitly, so
/// publishes never echo back to their origin — that would double-refresh.
#[derive(Default)]
pub struct SettingsBus {
    subscribers: Mutex<Vec<(usize, Weak<Settings>)>>,
    next_token: Mutex<usize>,
}

impl SettingsBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, settings: &Arc<Settings>) -> usize {
        let mut next = self
            .next_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let token = *next;
        *next += 1;
        drop(next);

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.push((token, Arc::downgrade(settings)));
        token
    }

    /// Notify all instances except the originating one.
    fn publish_from(&self, origin: usize) {
        let subscribers: Vec<Weak<Settings>> = {
            let mut guard = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.retain(|(_, weak)| weak.strong_count() > 0);
            guard
                .iter()
                .filter(|(token, _)| *token != origin)
                .map(|(_, weak)| weak.clone())
                .collect()
        };
        for weak in subscribers {
            if let Some(settings) = weak.upgrade() {
                if let Err(e) = settings.refresh() {
                    tracing::warn!("settings instance failed to refresh after broadcast: {e}");
                }
            }
        }
    }
}

/// In-memory view of the persisted settings, with change observation.
///
/// Each top-level browsing context owns one instance; all instances share
/// one [`SettingsBus`] and the same on-disk store.
pub struct Settings {
    store: SettingsStore,
    cache: RwLock<BTreeMap<String, Value>>,
    observers: Mutex<BTreeMap<String, Vec<ChangeListener>>>,
    bus: Arc<SettingsBus>,
    token: Mutex<Option<usize>>,
}

impl Settings {
    pub fn new(store: SettingsStore, bus: Arc<SettingsBus>) -> Arc<Self> {
        Arc::new(Self {
            store,
            cache: RwLock::new(BTreeMap::new()),
            observers: Mutex::new(BTreeMap::new()),
            bus,
            token: Mutex::new(None),
        })
    }

    /// Start the settings service: join the broadcast bus and load the
    /// persisted settings into the cache.
    pub fn start(self: &Arc<Self>) -> Result<(), CoreError> {
        info!("starting settings service");
        let token = self.bus.register(self);
        *self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.refresh()
    }

    /// Reload the cache from the store, notifying observers of every key
    /// whose value was added or changed.
    pub fn refresh(&self) -> Result<(), CoreError> {
        let fresh = self.store.list()?;

        let old = {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *cache, fresh.clone())
        };

        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (key, value) in &fresh {
            if old.get(key) == Some(value) {
                continue;
            }
            debug!("setting '{key}' changed");
            if let Some(listeners) = observers.get(key) {
                for listener in listeners {
                    listener(value);
                }
            }
        }
        Ok(())
    }

    /// Current cached value of a setting.
    pub fn get(&self, key: &str) -> Option<Value> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(key).cloned()
    }

    /// Persist a setting, broadcast the change to other instances, and
    /// refresh this instance's own cache.
    pub fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        self.store.update(key, value)?;
        let token = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(usize::MAX);
        self.bus.publish_from(token);
        self.refresh()
    }

    /// Observe a setting: `callback` runs whenever a refresh sees the key
    /// appear or change value.
    pub fn observe(&self, key: &str, callback: impl Fn(&Value) + Send + Sync + 'static) {
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        observers
            .entry(key.to_owned())
            .or_default()
            .push(Box::new(callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinshell_store::StoreLayout;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn layout() -> (tempfile::TempDir, StoreLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        (dir, layout)
    }

    #[test]
    fn set_then_get_roundtrip() {
        let (_dir, layout) = layout();
        let bus = Arc::new(SettingsBus::new());
        let settings = Settings::new(SettingsStore::new(layout), bus);
        settings.start().unwrap();

        settings
            .set(HOMEPAGE_KEY, json!("https://start.test/"))
            .unwrap();
        assert_eq!(settings.get(HOMEPAGE_KEY), Some(json!("https://start.test/")));
    }

    #[test]
    fn observers_fire_on_change_only() {
        let (_dir, layout) = layout();
        let bus = Arc::new(SettingsBus::new());
        let settings = Settings::new(SettingsStore::new(layout), bus);
        settings.start().unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        settings.observe(HOMEPAGE_KEY, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        settings.set(HOMEPAGE_KEY, json!("a")).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Unchanged value: refresh sees no difference, observer stays quiet.
        settings.set(HOMEPAGE_KEY, json!("a")).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        settings.set(HOMEPAGE_KEY, json!("b")).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn change_in_one_instance_reaches_the_other() {
        let (_dir, layout) = layout();
        let bus = Arc::new(SettingsBus::new());

        let chrome = Settings::new(SettingsStore::new(layout.clone()), Arc::clone(&bus));
        chrome.start().unwrap();
        let settings_view = Settings::new(SettingsStore::new(layout), Arc::clone(&bus));
        settings_view.start().unwrap();

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        settings_view.observe(HOMEPAGE_KEY, move |value| {
            *sink.lock().unwrap() = Some(value.clone());
        });

        chrome.set(HOMEPAGE_KEY, json!("https://new.test/")).unwrap();

        assert_eq!(settings_view.get(HOMEPAGE_KEY), Some(json!("https://new.test/")));
        assert_eq!(*seen.lock().unwrap(), Some(json!("https://new.test/")));
    }

    #[test]
    fn dropped_instances_fall_off_the_bus() {
        let (_dir, layout) = layout();
        let bus = Arc::new(SettingsBus::new());

        let a = Settings::new(SettingsStore::new(layout.clone()), Arc::clone(&bus));
        a.start().unwrap();
        let b = Settings::new(SettingsStore::new(layout), Arc::clone(&bus));
        b.start().unwrap();
        drop(b);

        // Publishing after a subscriber is gone must not fail.
        a.set(HOMEPAGE_KEY, json!("x")).unwrap();
        assert_eq!(a.get(HOMEPAGE_KEY), Some(json!("x")));
    }
}
