use crate::events::{EventBus, ShellEvent};
use crate::registry::{App, AppRegistry};
use pinshell_manifest::WindowId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use url::Url;

/// Pixel size requested when choosing a window's application icon; matches
/// the favicon slot it replaces.
pub const APP_ICON_TARGET_PX: u32 = 16;

/// How a window renders its chrome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    #[default]
    Browser,
    Standalone,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Browser => "browser",
            Self::Standalone => "standalone",
        })
    }
}

/// Display attributes of one top-level window. The window's lifecycle is
/// owned by the UI layer; the core only reads the current URL and writes
/// the display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDisplay {
    pub id: WindowId,
    pub current_url: Option<Url>,
    pub mode: DisplayState,
    pub application_name: Option<String>,
    pub application_icon_url: Option<Url>,
}

impl WindowDisplay {
    fn new(id: WindowId) -> Self {
        Self {
            id,
            current_url: None,
            mode: DisplayState::Browser,
            application_name: None,
            application_icon_url: None,
        }
    }
}

/// Re-evaluates every window's display mode against the set of pinned apps.
///
/// Driven by three explicit triggers: a completed navigation
/// ([`on_navigate`](Self::on_navigate)) and the pin/unpin side effects
/// ([`on_pinned`](Self::on_pinned), [`on_unpinned`](Self::on_unpinned))
/// that sweep already-open windows without waiting for their next
/// navigation.
pub struct WindowDisplayController {
    registry: Arc<AppRegistry>,
    windows: Mutex<BTreeMap<WindowId, WindowDisplay>>,
    events: Arc<EventBus>,
}

impl WindowDisplayController {
    pub fn new(registry: Arc<AppRegistry>, events: Arc<EventBus>) -> Self {
        Self {
            registry,
            windows: Mutex::new(BTreeMap::new()),
            events,
        }
    }

    /// Track a newly opened window, initially in browser mode.
    pub fn register_window(&self, id: WindowId) {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.entry(id.clone()).or_insert_with(|| WindowDisplay::new(id));
    }

    /// Stop tracking a closed window.
    pub fn remove_window(&self, id: &WindowId) {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.remove(id);
    }

    /// Snapshot of a window's current display attributes.
    pub fn window(&self, id: &WindowId) -> Option<WindowDisplay> {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.get(id).cloned()
    }

    /// Handle a completed navigation: re-match the new URL against the
    /// registry and toggle the window's display attributes accordingly.
    pub fn on_navigate(&self, id: &WindowId, url: Url) {
        let matched = self.registry.match_url(&url);

        // Mode changes are published only after the windows lock is gone;
        // handlers commonly read window state back through this controller.
        let pending = {
            let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(window) = windows.get_mut(id) else {
                return;
            };
            window.current_url = Some(url);

            match matched {
                Some(app) => Self::enter_standalone(window, &app),
                None => Self::enter_browser(window),
            }
        };
        if let Some(event) = pending {
            self.events.publish(&event);
        }
    }

    /// Pin side effect: every open window already inside the new app's
    /// scope flips to standalone immediately, without a navigation event.
    pub fn on_pinned(&self, app: &App) {
        let pending: Vec<ShellEvent> = {
            let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
            windows
                .values_mut()
                .filter(|w| w.current_url.as_ref().is_some_and(|url| app.contains(url)))
                .filter_map(|w| Self::enter_standalone(w, app))
                .collect()
        };
        for event in &pending {
            self.events.publish(event);
        }
    }

    /// Unpin side effect: every window inside the removed app's former
    /// scope reverts to browser mode immediately. Deliberately does not
    /// re-check whether another overlapping app still applies; that
    /// correction happens lazily on the window's next navigation.
    pub fn on_unpinned(&self, app: &App) {
        let pending: Vec<ShellEvent> = {
            let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
            windows
                .values_mut()
                .filter(|w| w.current_url.as_ref().is_some_and(|url| app.contains(url)))
                .filter_map(Self::enter_browser)
                .collect()
        };
        for event in &pending {
            self.events.publish(event);
        }
    }

    fn enter_standalone(window: &mut WindowDisplay, app: &App) -> Option<ShellEvent> {
        let changed = window.mode != DisplayState::Standalone;
        window.mode = DisplayState::Standalone;
        window.application_name = Some(app.manifest.display_name().to_owned());
        // Keep the previous icon when the app has none to offer.
        if let Some(icon) = app.best_icon(APP_ICON_TARGET_PX) {
            window.application_icon_url = Some(icon.clone());
        }
        if !changed {
            return None;
        }
        debug!("window {} entering standalone mode", window.id);
        Some(ShellEvent::DisplayChanged {
            window_id: window.id.clone(),
            mode: DisplayState::Standalone,
        })
    }

    fn enter_browser(window: &mut WindowDisplay) -> Option<ShellEvent> {
        let changed = window.mode != DisplayState::Browser;
        window.mode = DisplayState::Browser;
        window.application_name = None;
        window.application_icon_url = None;
        if !changed {
            return None;
        }
        debug!("window {} entering browser mode", window.id);
        Some(ShellEvent::DisplayChanged {
            window_id: window.id.clone(),
            mode: DisplayState::Browser,
        })
    }
}
