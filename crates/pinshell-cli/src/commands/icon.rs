use super::{CliError, EXIT_SUCCESS};
use pinshell_manifest::{best_icon, parse_raw_file, parse_url, process};
use std::path::Path;

pub fn run(
    manifest: &Path,
    manifest_url: &str,
    document_url: &str,
    size: u32,
) -> Result<u8, CliError> {
    let raw = parse_raw_file(manifest)?;
    let manifest_url = parse_url(manifest_url)?;
    let document_url = parse_url(document_url)?;

    let normalized = process(&raw, &manifest_url, &document_url);
    let icon = best_icon(&normalized.icons, size)
        .ok_or_else(|| CliError::Other(format!("no eligible icon for {size}px")))?;
    println!("{icon}");
    Ok(EXIT_SUCCESS)
}
