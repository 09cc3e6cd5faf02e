use crate::icons::{process_image_resources, IconResource};
use crate::scope::is_within_scope;
use crate::types::{AppId, DisplayMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use url::Url;

/// Normalized in-memory representation of a web app manifest.
///
/// Produced by [`process`], which follows the processing algorithm of the
/// Web App Manifest specification with per-field fallback rules. Invariants:
/// `start_url` is absolute and same-origin as the document URL, `id` is
/// same-origin with `start_url`, and `start_url` is within `scope`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedManifest {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub start_url: Url,
    pub id: Url,
    pub scope: Url,
    pub icons: Vec<IconResource>,
    /// Passed through verbatim; the specification currently defines no
    /// processing steps for this member.
    pub theme_color: Option<Value>,
    pub display: Option<DisplayMode>,
}

impl NormalizedManifest {
    /// The identity key under which this app is registered and persisted.
    pub fn app_id(&self) -> AppId {
        AppId::from(&self.id)
    }

    /// Name preferred for window chrome: `name`, falling back to `short_name`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.short_name.as_deref())
            .unwrap_or("")
    }
}

/// Process a raw manifest into its normalized representation.
///
/// Never fails: a document that is not a JSON object is treated as the
/// empty manifest (with a developer warning), and every member that fails
/// its own processing step independently falls back to its default.
pub fn process(raw: &Value, manifest_url: &Url, document_url: &Url) -> NormalizedManifest {
    let empty = Value::Object(serde_json::Map::new());
    let raw = if raw.is_object() {
        raw
    } else {
        warn!("web app manifest should be an object");
        &empty
    };

    let name = process_text_member(raw.get("name"));
    let short_name = process_text_member(raw.get("short_name"));
    let start_url = process_start_url_member(raw.get("start_url"), manifest_url, document_url);
    let id = process_id_member(raw.get("id"), &start_url);
    let scope = process_scope_member(raw.get("scope"), &start_url, manifest_url);
    let icons = process_image_resources(raw.get("icons"), manifest_url);
    let theme_color = raw.get("theme_color").cloned();
    let display = process_display_member(raw.get("display"));

    NormalizedManifest {
        name,
        short_name,
        start_url,
        id,
        scope,
        icons,
        theme_color,
        display,
    }
}

/// Text members are absent unless a non-empty string; whitespace is trimmed.
fn process_text_member(value: Option<&Value>) -> Option<String> {
    let text = value.and_then(Value::as_str)?.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_owned())
}

fn process_start_url_member(value: Option<&Value>, manifest_url: &Url, document_url: &Url) -> Url {
    let Some(raw) = value.and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return document_url.clone();
    };

    let Ok(start_url) = manifest_url.join(raw) else {
        warn!("failed to resolve start_url '{raw}' against manifest URL, using document URL");
        return document_url.clone();
    };

    if start_url.origin() != document_url.origin() {
        warn!("start_url must be same-origin as the document, using document URL");
        return document_url.clone();
    }

    start_url
}

/// The `id` member overrides the default identity (`start_url`) only when it
/// resolves, against `start_url`'s origin, to a same-origin URL. Every
/// failure falls back silently.
fn process_id_member(value: Option<&Value>, start_url: &Url) -> Url {
    let Some(raw) = value.and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return start_url.clone();
    };

    let Ok(base_origin) = Url::parse(&start_url.origin().ascii_serialization()) else {
        return start_url.clone();
    };
    let Ok(id) = base_origin.join(raw) else {
        return start_url.clone();
    };
    if id.origin() != start_url.origin() {
        return start_url.clone();
    }
    id
}

fn process_scope_member(value: Option<&Value>, start_url: &Url, manifest_url: &Url) -> Url {
    // Default scope is start_url's directory.
    let default = start_url
        .join(".")
        .unwrap_or_else(|_| start_url.clone());

    let Some(raw) = value.and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return default;
    };

    let Ok(mut scope) = manifest_url.join(raw) else {
        warn!("failed to resolve scope '{raw}', using default scope");
        return default;
    };
    scope.set_query(None);
    scope.set_fragment(None);

    if !is_within_scope(start_url, &scope) {
        warn!("start_url is not within the declared scope, using default scope");
        return default;
    }
    scope
}

fn process_display_member(value: Option<&Value>) -> Option<DisplayMode> {
    value.and_then(Value::as_str).and_then(DisplayMode::from_token)
}
