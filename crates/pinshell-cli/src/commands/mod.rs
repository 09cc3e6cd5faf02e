pub mod icon;
pub mod inspect;
pub mod list;
pub mod pin;
pub mod resolve;
pub mod seed;
pub mod settings;
pub mod unpin;

use pinshell_core::{App, AppRegistry, CoreError, EventBus, StoreLock};
use pinshell_manifest::ManifestError;
use pinshell_store::{AppStore, StoreError, StoreLayout};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;
pub const EXIT_NO_MATCH: u8 = 4;

/// Command failure carrying the exit code it maps to. Routing is by error
/// kind, not message text, so wrapped store failures inside pin/unpin land
/// on the store exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Manifest(String),
    #[error("{0}")]
    Store(String),
    #[error("{0}")]
    NoMatch(String),
    #[error("{0}")]
    Other(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Manifest(_) => EXIT_MANIFEST_ERROR,
            Self::Store(_) => EXIT_STORE_ERROR,
            Self::NoMatch(_) => EXIT_NO_MATCH,
            Self::Other(_) => EXIT_FAILURE,
        }
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::Store(format!("store error: {e}"))
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidManifest(_) | CoreError::Manifest(_) => {
                Self::Manifest(e.to_string())
            }
            CoreError::PinAppFailed { .. }
            | CoreError::UnpinAppFailed { .. }
            | CoreError::Store(_) => Self::Store(e.to_string()),
            CoreError::Io(_) => Self::Other(e.to_string()),
        }
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Other(format!("JSON serialization failed: {e}")))
}

/// Open the store and load the registry into memory.
pub fn open_registry(store_path: &Path) -> Result<Arc<AppRegistry>, CliError> {
    let layout = StoreLayout::new(store_path);
    layout.initialize()?;
    let registry = Arc::new(AppRegistry::new(
        AppStore::new(layout),
        Arc::new(EventBus::new()),
    ));
    registry.start()?;
    Ok(registry)
}

/// Take the exclusive store lock for a mutating command.
pub fn lock_store(store_path: &Path) -> Result<StoreLock, CliError> {
    let layout = StoreLayout::new(store_path);
    StoreLock::try_acquire(&layout.lock_file())
        .map_err(|e| CliError::Store(format!("store lock: {e}")))?
        .ok_or_else(|| CliError::Store("another pinshell process holds the store".to_owned()))
}

pub fn colorize_mode(mode: &str) -> String {
    use console::Style;
    match mode {
        "standalone" => Style::new().cyan().bold().apply_to(mode).to_string(),
        "fullscreen" => Style::new().magenta().apply_to(mode).to_string(),
        "minimal-ui" => Style::new().yellow().apply_to(mode).to_string(),
        "browser" => Style::new().dim().apply_to(mode).to_string(),
        other => other.to_owned(),
    }
}

/// Render an app the same way for `list`, `resolve`, and `pin --json`.
pub fn app_to_json(app: &App) -> serde_json::Value {
    serde_json::json!({
        "id": app.id,
        "manifest_url": app.manifest_url,
        "document_url": app.document_url,
        "manifest": app.manifest,
    })
}

pub fn print_app(app: &App) {
    let mode = app
        .manifest
        .display
        .map_or_else(|| "browser".to_owned(), |d| d.to_string());
    println!("id:           {}", app.id);
    println!("name:         {}", app.manifest.display_name());
    println!("start_url:    {}", app.manifest.start_url);
    println!("scope:        {}", app.manifest.scope);
    println!("display:      {}", colorize_mode(&mode));
    println!("icons:        {}", app.manifest.icons.len());
    println!("manifest_url: {}", app.manifest_url);
}
