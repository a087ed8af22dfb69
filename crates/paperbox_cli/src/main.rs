//! Paperbox command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from the environment and CLI flags.
//! - Drive the article repository and print results as JSON.

mod commands;

use clap::Parser;
use paperbox_core::{init_logging, AppConfig, StoreConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "paperbox")]
#[command(about = "Manage articles stored as JSON files", version)]
struct Cli {
    /// Base directory holding all collections (overrides PAPERBOX_STORAGE_DIR).
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Collection to operate on (overrides PAPERBOX_COLLECTION).
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: commands::Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    if let Some(dir) = cli.storage_dir {
        config.store = StoreConfig::new(dir);
    }
    if let Some(collection) = cli.collection {
        config.collection = collection;
    }

    if let Some(log_dir) = config.log_dir.as_deref() {
        // Logging is optional for the CLI; a broken log dir must not block CRUD.
        if let Err(err) = init_logging(config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match commands::handle_command(cli.command, &config) {
        Ok(outcome) => outcome.report(),
        Err(err) => {
            log::error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
