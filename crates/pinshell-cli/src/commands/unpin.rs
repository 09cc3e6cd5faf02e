use super::{lock_store, open_registry, CliError, EXIT_SUCCESS};
use std::path::Path;
use url::Url;

/// Unpin by app id, or — mirroring the shell's "unpin this site" flow —
/// by any URL, resolved to an app via scope matching.
pub fn run(store_path: &Path, target: &str) -> Result<u8, CliError> {
    let _lock = lock_store(store_path)?;
    let registry = open_registry(store_path)?;

    let id = registry
        .list()
        .iter()
        .find(|app| app.id == *target)
        .map(|app| app.id.clone())
        .or_else(|| {
            let url = Url::parse(target).ok()?;
            registry.match_url(&url).map(|app| app.id)
        })
        .ok_or_else(|| CliError::NoMatch(format!("no app matches '{target}'")))?;

    registry.unpin(&id)?;
    println!("unpinned {id}");
    Ok(EXIT_SUCCESS)
}
