use super::{app_to_json, json_pretty, open_registry, print_app, CliError, EXIT_SUCCESS};
use pinshell_manifest::parse_url;
use std::path::Path;

pub fn run(store_path: &Path, url: &str, json: bool) -> Result<u8, CliError> {
    let url = parse_url(url)?;
    let registry = open_registry(store_path)?;

    let app = registry
        .match_url(&url)
        .ok_or_else(|| CliError::NoMatch(format!("no app matches '{url}'")))?;

    if json {
        println!("{}", json_pretty(&app_to_json(&app))?);
    } else {
        print_app(&app);
    }
    Ok(EXIT_SUCCESS)
}
