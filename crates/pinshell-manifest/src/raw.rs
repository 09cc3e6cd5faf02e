use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Parse raw manifest text into an untrusted JSON value.
///
/// A non-object document is not rejected here; `process` treats anything
/// that is not an object as the empty manifest.
pub fn parse_raw_str(input: &str) -> Result<Value, ManifestError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_raw_file(path: impl AsRef<Path>) -> Result<Value, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_raw_str(&content)
}

/// Parse an absolute URL, attributing failures to the offending input.
pub fn parse_url(input: &str) -> Result<Url, ManifestError> {
    Url::parse(input).map_err(|source| ManifestError::InvalidUrl {
        url: input.to_owned(),
        source,
    })
}
