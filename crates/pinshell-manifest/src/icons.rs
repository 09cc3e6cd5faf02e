use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;
use url::Url;

/// Purposes an icon may declare. Unknown tokens are dropped during processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconPurpose {
    Any,
    Maskable,
    Monochrome,
}

impl IconPurpose {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "any" => Some(Self::Any),
            "maskable" => Some(Self::Maskable),
            "monochrome" => Some(Self::Monochrome),
            _ => None,
        }
    }
}

impl fmt::Display for IconPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "any",
            Self::Maskable => "maskable",
            Self::Monochrome => "monochrome",
        })
    }
}

/// A processed image resource from a manifest's `icons` member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IconResource {
    /// Absolute URL of the image, resolved against the manifest URL.
    /// `None` when the raw value was present but not a resolvable string.
    pub src: Option<Url>,
    /// Declared MIME type, passed through without validation.
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    /// Lowercased size tokens such as `32x32` or `any`. `None` when the
    /// raw member was missing or not a string.
    pub sizes: Option<BTreeSet<String>>,
    /// Declared purposes; defaults to `{any}`.
    pub purpose: BTreeSet<IconPurpose>,
}

impl IconResource {
    /// An icon is eligible for generic display unless it is purely
    /// decorative or adaptive (maskable/monochrome without `any`).
    fn eligible_for_display(&self) -> bool {
        self.src.is_some() && self.purpose.contains(&IconPurpose::Any)
    }
}

/// Process the `icons` member of a raw manifest.
///
/// Missing or non-list input yields an empty sequence. Entries whose raw
/// `src` key is absent are dropped entirely; entries with an unresolvable
/// `src` are kept with `src: None` and skipped later by selection.
pub fn process_image_resources(value: Option<&Value>, manifest_url: &Url) -> Vec<IconResource> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    let mut icons = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.get("src").is_none() {
            continue;
        }
        icons.push(IconResource {
            src: process_src_member(entry.get("src"), manifest_url),
            mime_type: process_type_member(entry.get("type")),
            sizes: process_sizes_member(entry.get("sizes")),
            purpose: process_purpose_member(entry.get("purpose")),
        });
    }
    icons
}

fn process_src_member(value: Option<&Value>, manifest_url: &Url) -> Option<Url> {
    let src = value.and_then(Value::as_str).filter(|s| !s.is_empty())?;
    manifest_url.join(src).ok()
}

fn process_type_member(value: Option<&Value>) -> Option<String> {
    // No MIME validation; the raw string is carried as-is.
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn process_sizes_member(value: Option<&Value>) -> Option<BTreeSet<String>> {
    let sizes = value.and_then(Value::as_str).filter(|s| !s.is_empty())?;
    Some(
        sizes
            .split_ascii_whitespace()
            .map(str::to_lowercase)
            .collect(),
    )
}

fn process_purpose_member(value: Option<&Value>) -> BTreeSet<IconPurpose> {
    let default = || BTreeSet::from([IconPurpose::Any]);

    let Some(raw) = value.and_then(Value::as_str) else {
        return default();
    };
    if raw.trim().is_empty() {
        return default();
    }

    let mut purposes = BTreeSet::new();
    for keyword in raw.split_ascii_whitespace() {
        let canonical = keyword.to_lowercase();
        let Some(purpose) = IconPurpose::from_token(&canonical) else {
            warn!("ignoring invalid icon purpose '{keyword}'");
            continue;
        };
        if !purposes.insert(purpose) {
            warn!("ignoring duplicate icon purpose '{keyword}'");
        }
    }

    // All supplied tokens were invalid: fall back to the default purpose,
    // same as when no purpose was given at all.
    if purposes.is_empty() {
        return default();
    }
    purposes
}

/// Select the best icon for a target pixel size, scanning in manifest order.
///
/// Prefers the smallest declared size that is at least `target_size_px`;
/// an icon declaring size `any` wins outright and stops further size
/// comparisons. Returns the winning icon's `src`, if any icon is eligible.
pub fn best_icon(icons: &[IconResource], target_size_px: u32) -> Option<&Url> {
    #[derive(Clone, Copy, PartialEq)]
    enum BestSize {
        Unset,
        Any,
        Px(u32),
    }

    let mut best: Option<&IconResource> = None;
    let mut best_size = BestSize::Unset;

    for icon in icons {
        if !icon.eligible_for_display() {
            continue;
        }

        if best.is_none() {
            best = Some(icon);
        }

        let sizes = icon.sizes.as_ref();

        if sizes.is_some_and(|s| s.contains("any")) {
            best = Some(icon);
            best_size = BestSize::Any;
            continue;
        }
        if best_size == BestSize::Any {
            continue;
        }

        let Some(sizes) = sizes else {
            continue;
        };
        for token in sizes {
            // Tokens are `<width>x<height>`; only the leading integer matters.
            let Some(size) = token
                .split('x')
                .next()
                .and_then(|w| w.parse::<u32>().ok())
            else {
                continue;
            };

            match best_size {
                BestSize::Unset => {
                    best_size = BestSize::Px(size);
                    best = Some(icon);
                }
                BestSize::Px(current) => {
                    // Adequate and no larger than the current best.
                    if size >= target_size_px && size <= current {
                        best_size = BestSize::Px(size);
                        best = Some(icon);
                    // Current best is still below target; any growth helps.
                    } else if current < target_size_px && size > current {
                        best_size = BestSize::Px(size);
                        best = Some(icon);
                    // Below target but closer than the current best.
                    } else if size <= target_size_px && size >= current {
                        best_size = BestSize::Px(size);
                        best = Some(icon);
                    }
                }
                BestSize::Any => {}
            }
        }
    }

    best.and_then(|icon| icon.src.as_ref())
}
