mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pinshell",
    version,
    about = "Pinned web app store for the Pinshell browser shell"
)]
struct Cli {
    /// Path to the Pinshell store directory.
    #[arg(long, default_value = "~/.local/share/pinshell")]
    store: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process a manifest file and print its normalized form without pinning.
    Inspect {
        /// Path to the raw manifest JSON file.
        manifest: PathBuf,
        /// URL the manifest was retrieved from.
        #[arg(long)]
        manifest_url: String,
        /// URL of the document the manifest was linked from.
        #[arg(long)]
        document_url: String,
    },
    /// Pin a web app from a manifest file.
    Pin {
        /// Path to the raw manifest JSON file.
        manifest: PathBuf,
        /// URL the manifest was retrieved from.
        #[arg(long)]
        manifest_url: String,
        /// URL of the document the manifest was linked from.
        #[arg(long)]
        document_url: String,
        /// Overwrite the stored record if the app is already pinned.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Unpin an app by id, or by any URL within its scope.
    Unpin {
        /// App id, or a URL resolved against pinned scopes.
        target: String,
    },
    /// List pinned apps.
    List,
    /// Find the pinned app whose scope contains a URL.
    Resolve {
        url: String,
    },
    /// Pick the best icon from a manifest for a target pixel size.
    Icon {
        /// Path to the raw manifest JSON file.
        manifest: PathBuf,
        /// URL the manifest was retrieved from.
        #[arg(long)]
        manifest_url: String,
        /// URL of the document the manifest was linked from.
        #[arg(long)]
        document_url: String,
        /// Target icon size in pixels.
        #[arg(long, default_value_t = pinshell_core::APP_ICON_TARGET_PX)]
        size: u32,
    },
    /// Read or write shell settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Seed the store with default apps and settings from a JSON file.
    Seed {
        defaults: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    Get { key: String },
    /// Set a setting; the value is parsed as JSON, falling back to a string.
    Set { key: String, value: String },
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PINSHELL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let store_path = expand_tilde(&cli.store);
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Inspect {
            manifest,
            manifest_url,
            document_url,
        } => commands::inspect::run(&manifest, &manifest_url, &document_url, json_output),
        Commands::Pin {
            manifest,
            manifest_url,
            document_url,
            force,
        } => commands::pin::run(
            &store_path,
            &manifest,
            &manifest_url,
            &document_url,
            force,
            json_output,
        ),
        Commands::Unpin { target } => commands::unpin::run(&store_path, &target),
        Commands::List => commands::list::run(&store_path, json_output),
        Commands::Resolve { url } => commands::resolve::run(&store_path, &url, json_output),
        Commands::Icon {
            manifest,
            manifest_url,
            document_url,
            size,
        } => commands::icon::run(&manifest, &manifest_url, &document_url, size),
        Commands::Settings { action } => match action {
            SettingsAction::Get { key } => commands::settings::get(&store_path, &key),
            SettingsAction::Set { key, value } => commands::settings::set(&store_path, &key, &value),
            SettingsAction::List => commands::settings::list(&store_path, json_output),
        },
        Commands::Seed { defaults } => commands::seed::run(&store_path, &defaults),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
