use super::{app_to_json, json_pretty, lock_store, open_registry, print_app, CliError, EXIT_SUCCESS};
use pinshell_manifest::parse_raw_file;
use std::path::Path;

pub fn run(
    store_path: &Path,
    manifest: &Path,
    manifest_url: &str,
    document_url: &str,
    force: bool,
    json: bool,
) -> Result<u8, CliError> {
    let raw = parse_raw_file(manifest)?;

    let _lock = lock_store(store_path)?;
    let registry = open_registry(store_path)?;
    let app = if force {
        registry.repin(manifest_url, document_url, raw)?
    } else {
        registry.pin(manifest_url, document_url, raw)?
    };

    if json {
        println!("{}", json_pretty(&app_to_json(&app))?);
    } else {
        println!("pinned {}", app.id);
        print_app(&app);
    }
    Ok(EXIT_SUCCESS)
}
