use super::{json_pretty, CliError, EXIT_SUCCESS};
use pinshell_manifest::{parse_raw_file, parse_url, process};
use std::path::Path;

pub fn run(
    manifest: &Path,
    manifest_url: &str,
    document_url: &str,
    json: bool,
) -> Result<u8, CliError> {
    let raw = parse_raw_file(manifest)?;
    let manifest_url = parse_url(manifest_url)?;
    let document_url = parse_url(document_url)?;

    let normalized = process(&raw, &manifest_url, &document_url);
    if json {
        println!("{}", json_pretty(&normalized)?);
    } else {
        println!("id:         {}", normalized.id);
        println!("name:       {}", normalized.name.as_deref().unwrap_or("(none)"));
        println!(
            "short_name: {}",
            normalized.short_name.as_deref().unwrap_or("(none)")
        );
        println!("start_url:  {}", normalized.start_url);
        println!("scope:      {}", normalized.scope);
        match normalized.display {
            Some(display) => println!("display:    {}", super::colorize_mode(display.as_str())),
            None => println!("display:    (none)"),
        }
        for icon in &normalized.icons {
            let src = icon.src.as_ref().map_or("(unresolved)", |u| u.as_str());
            let sizes = icon.sizes.as_ref().map_or_else(
                || "-".to_owned(),
                |s| s.iter().cloned().collect::<Vec<_>>().join(" "),
            );
            println!("icon:       {src} [{sizes}]");
        }
    }
    Ok(EXIT_SUCCESS)
}
