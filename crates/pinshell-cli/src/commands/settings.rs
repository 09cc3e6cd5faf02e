use super::{json_pretty, lock_store, CliError, EXIT_SUCCESS};
use pinshell_store::{SettingsStore, StoreLayout};
use serde_json::Value;
use std::path::Path;

fn open(store_path: &Path) -> Result<SettingsStore, CliError> {
    let layout = StoreLayout::new(store_path);
    layout.initialize()?;
    Ok(SettingsStore::new(layout))
}

pub fn get(store_path: &Path, key: &str) -> Result<u8, CliError> {
    let store = open(store_path)?;
    let value = store.read(key)?;
    println!("{value}");
    Ok(EXIT_SUCCESS)
}

pub fn set(store_path: &Path, key: &str, value: &str) -> Result<u8, CliError> {
    // Accept JSON values; bare words become strings.
    let value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));

    let _lock = lock_store(store_path)?;
    let store = open(store_path)?;
    store.update(key, value)?;
    println!("set '{key}'");
    Ok(EXIT_SUCCESS)
}

pub fn list(store_path: &Path, json: bool) -> Result<u8, CliError> {
    let store = open(store_path)?;
    let settings = store.list()?;
    if json {
        println!("{}", json_pretty(&settings)?);
    } else if settings.is_empty() {
        println!("no settings stored");
    } else {
        for (key, value) in &settings {
            println!("{key} = {value}");
        }
    }
    Ok(EXIT_SUCCESS)
}
