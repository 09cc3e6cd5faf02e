//! Web app manifest processing for Pinshell.
//!
//! This crate defines the manifest layer: untrusted JSON parsing (`parse_raw_str`),
//! specification-driven normalization (`process` producing a `NormalizedManifest`),
//! icon resource processing and best-icon selection (`best_icon`), and navigation
//! scope matching (`is_within_scope`).

pub mod icons;
pub mod process;
pub mod raw;
pub mod scope;
pub mod types;

pub use icons::{best_icon, IconPurpose, IconResource};
pub use process::{process, NormalizedManifest};
pub use raw::{parse_raw_file, parse_raw_str, parse_url, ManifestError};
pub use scope::is_within_scope;
pub use types::{AppId, DisplayMode, WindowId};
