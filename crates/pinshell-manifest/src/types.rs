//! Newtype wrappers and enumerations shared across the manifest layer.
//!
//! All newtypes serialize/deserialize as plain strings for backward compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Application identity: the processed `id` URL of a web app manifest,
    /// kept as a string because it is used as a record key.
    AppId
);

string_newtype!(
    /// Identifier of a top-level browser window, assigned by the UI layer.
    WindowId
);

impl From<&url::Url> for AppId {
    fn from(url: &url::Url) -> Self {
        Self(url.as_str().to_owned())
    }
}

/// Display mode requested by a manifest, validated against the four values
/// the Web App Manifest specification enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    Fullscreen,
    Standalone,
    MinimalUi,
    Browser,
}

impl DisplayMode {
    /// Parse a raw manifest token. Returns `None` for anything outside the
    /// enumerated set; callers treat that as an absent member.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "fullscreen" => Some(Self::Fullscreen),
            "standalone" => Some(Self::Standalone),
            "minimal-ui" => Some(Self::MinimalUi),
            "browser" => Some(Self::Browser),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fullscreen => "fullscreen",
            Self::Standalone => "standalone",
            Self::MinimalUi => "minimal-ui",
            Self::Browser => "browser",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_display_and_as_ref() {
        let id = AppId::new("https://x.test/app/");
        assert_eq!(id.to_string(), "https://x.test/app/");
        assert_eq!(id.as_str(), "https://x.test/app/");
        assert_eq!(AsRef::<str>::as_ref(&id), "https://x.test/app/");
    }

    #[test]
    fn app_id_serde_roundtrip() {
        let id = AppId::new("https://x.test/");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"https://x.test/\"");
        let back: AppId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn app_id_from_url() {
        let url = url::Url::parse("https://x.test/app/").unwrap();
        let id = AppId::from(&url);
        assert_eq!(id.as_str(), "https://x.test/app/");
    }

    #[test]
    fn window_id_equality() {
        let a = WindowId::new("w1");
        let b = WindowId::new("w1");
        let c = WindowId::new("w2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_mode_tokens() {
        assert_eq!(
            DisplayMode::from_token("standalone"),
            Some(DisplayMode::Standalone)
        );
        assert_eq!(
            DisplayMode::from_token("minimal-ui"),
            Some(DisplayMode::MinimalUi)
        );
        assert_eq!(DisplayMode::from_token("popup"), None);
        assert_eq!(DisplayMode::from_token("Standalone"), None);
    }

    #[test]
    fn display_mode_serde_is_kebab_case() {
        let json = serde_json::to_string(&DisplayMode::MinimalUi).unwrap();
        assert_eq!(json, "\"minimal-ui\"");
    }
}
