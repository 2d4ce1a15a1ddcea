// src/cli/mod.rs
use crate::cli::args::{Cli, Commands};
use crate::cli::error::CliResult;
use crate::config::Settings;
use crate::BookmarkStore;
use std::fs;
use tracing::{debug, instrument};

pub mod args;
pub mod bookmark_commands;
pub mod error;
pub mod tag_commands;

pub fn execute_command(cli: Cli, settings: &Settings) -> CliResult<()> {
    if cli.generate_config {
        println!("{}", crate::config::generate_default_config());
        return Ok(());
    }
    match cli.command {
        Some(Commands::Add { .. }) => bookmark_commands::add(cli, settings),
        Some(Commands::List { .. }) => bookmark_commands::list(cli, settings),
        Some(Commands::Search { .. }) => bookmark_commands::search(cli, settings),
        Some(Commands::Delete { .. }) => bookmark_commands::delete(cli, settings),
        Some(Commands::Tag { .. }) => tag_commands::tag(cli, settings),
        Some(Commands::Tags { .. }) => tag_commands::show_tags(cli, settings),
        None => Ok(()),
    }
}

/// Opens the configured store, creating the parent directory of a new database file.
#[instrument(level = "debug", skip(settings))]
pub(crate) fn open_store(settings: &Settings) -> CliResult<BookmarkStore> {
    let config = settings.store_config();
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating database directory: {:?}", parent);
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BookmarkStore::open_with(config)?)
}
