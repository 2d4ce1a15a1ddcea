// src/cli/tag_commands.rs
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::open_store;
use crate::config::Settings;
use crate::domain::repositories::repository::BookmarkRepository;
use crate::domain::tag::Tag;
use crossterm::style::Stylize;
use serde::Serialize;
use std::fmt::Write;
use tracing::instrument;

#[derive(Serialize)]
struct TagCount<'a> {
    #[serde(flatten)]
    tag: &'a Tag,
    count: usize,
}

#[instrument(skip(cli, settings))]
pub fn tag(cli: Cli, settings: &Settings) -> CliResult<()> {
    if let Some(Commands::Tag {
        id,
        tags,
        category,
        confidence,
    }) = cli.command
    {
        let names = Tag::parse_names(&tags)?;
        if names.is_empty() {
            return Err(CliError::InvalidInput("No tags given".to_string()));
        }

        let store = open_store(settings)?;
        if store.get_bookmark(id)?.is_none() {
            return Err(CliError::InvalidInput(format!("No bookmark with id: {}", id)));
        }

        for name in &names {
            let tag = store.add_tag(name, category.as_deref(), confidence.is_some())?;
            store.tag_bookmark(id, tag.id, confidence)?;
        }
        eprintln!("Tagged {} with: {}", id, names.join(",").green());
    }
    Ok(())
}

#[instrument(skip(cli, settings))]
pub fn show_tags(cli: Cli, settings: &Settings) -> CliResult<()> {
    if let Some(Commands::Tags { is_json }) = cli.command {
        let store = open_store(settings)?;
        let tags = store.get_tags()?;

        if is_json {
            let rows: Vec<TagCount> = tags
                .iter()
                .map(|(tag, count)| TagCount { tag, count: *count })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        let mut output = String::new();
        for (tag, count) in &tags {
            // writing into a String cannot fail
            let _ = writeln!(&mut output, "{} ({})", tag.name.clone().green(), count);
        }
        print!("{}", output);
    }
    Ok(())
}
