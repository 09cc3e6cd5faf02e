//! Core services for the Pinshell browser shell.
//!
//! This crate ties manifest processing and the record store together into the
//! stateful services the (external) UI chrome drives: the `AppRegistry` of
//! pinned apps with scope-based URL matching, the `Settings` service with its
//! cross-instance broadcast bus, and the `WindowDisplayController` that flips
//! windows between browser and standalone display. Services are plain structs
//! wired by dependency injection; the UI invokes explicit methods
//! (`pin`, `unpin`, `on_navigate`) rather than lifecycle hooks.

pub mod concurrency;
pub mod events;
pub mod registry;
pub mod settings;
pub mod windows;

pub use concurrency::StoreLock;
pub use events::{EventBus, ShellEvent};
pub use registry::{App, AppRegistry};
pub use settings::{Settings, SettingsBus};
pub use windows::{DisplayState, WindowDisplay, WindowDisplayController, APP_ICON_TARGET_PX};

use pinshell_manifest::AppId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The manifest (or its retrieval URLs) could not be turned into an app.
    #[error("invalid web app manifest: {0}")]
    InvalidManifest(String),
    #[error("failed to pin app '{id}': {source}")]
    PinAppFailed {
        id: AppId,
        #[source]
        source: pinshell_store::StoreError,
    },
    #[error("failed to unpin app '{id}': {source}")]
    UnpinAppFailed {
        id: AppId,
        #[source]
        source: pinshell_store::StoreError,
    },
    #[error("store error: {0}")]
    Store(#[from] pinshell_store::StoreError),
    #[error("manifest error: {0}")]
    Manifest(#[from] pinshell_manifest::ManifestError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
