use super::{lock_store, CliError, EXIT_SUCCESS};
use pinshell_store::{seed_defaults, StoreDefaults, StoreLayout};
use std::path::Path;

pub fn run(store_path: &Path, defaults: &Path) -> Result<u8, CliError> {
    let content = std::fs::read_to_string(defaults)
        .map_err(|e| CliError::Other(format!("failed to read defaults file: {e}")))?;
    let defaults = StoreDefaults::parse(&content)
        .map_err(|e| CliError::Other(format!("failed to parse defaults: {e}")))?;

    let _lock = lock_store(store_path)?;
    let layout = StoreLayout::new(store_path);
    seed_defaults(&layout, &defaults)?;
    println!(
        "seeded {} apps and {} settings (existing records untouched)",
        defaults.apps.len(),
        defaults.settings.len()
    );
    Ok(EXIT_SUCCESS)
}
