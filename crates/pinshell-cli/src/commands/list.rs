use super::{app_to_json, colorize_mode, json_pretty, open_registry, CliError, EXIT_SUCCESS};
use std::path::Path;

pub fn run(store_path: &Path, json: bool) -> Result<u8, CliError> {
    let registry = open_registry(store_path)?;
    let apps = registry.list();

    if json {
        let values: Vec<_> = apps.iter().map(app_to_json).collect();
        println!("{}", json_pretty(&values)?);
    } else if apps.is_empty() {
        println!("no apps pinned");
    } else {
        println!("{:<24} {:<12} {:<40} SCOPE", "NAME", "DISPLAY", "ID");
        for app in &apps {
            let mode = app
                .manifest
                .display
                .map_or_else(|| "browser".to_owned(), |d| d.to_string());
            println!(
                "{:<24} {:<12} {:<40} {}",
                app.manifest.display_name(),
                colorize_mode(&mode),
                app.id,
                app.manifest.scope
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
