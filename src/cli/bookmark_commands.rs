// src/cli/bookmark_commands.rs
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::open_store;
use crate::config::Settings;
use crate::domain::bookmark::{Bookmark, BookmarkDraft};
use crate::domain::repositories::repository::BookmarkRepository;
use crate::domain::tag::Tag;
use crossterm::style::Stylize;
use tracing::{debug, instrument};

#[instrument(skip(cli, settings))]
pub fn add(cli: Cli, settings: &Settings) -> CliResult<()> {
    if let Some(Commands::Add {
        url,
        title,
        description,
        content_snippet,
        source,
        tags,
    }) = cli.command
    {
        let tag_names = match tags {
            Some(t) => Tag::parse_names(t)?,
            None => Vec::new(),
        };

        let mut draft = BookmarkDraft::new(title, url);
        if let Some(d) = description {
            draft = draft.with_description(d);
        }
        if let Some(s) = content_snippet {
            draft = draft.with_content_snippet(s);
        }
        if let Some(s) = source {
            draft = draft.with_source(s);
        }

        let store = open_store(settings)?;
        let id = store.add_tagged(&draft, &tag_names)?;

        eprintln!("Added bookmark: {}", id.to_string().green());
        println!("{}", id);
    }
    Ok(())
}

#[instrument(skip(cli, settings))]
pub fn list(cli: Cli, settings: &Settings) -> CliResult<()> {
    if let Some(Commands::List { is_json }) = cli.command {
        let store = open_store(settings)?;
        let bookmarks = store.get_bookmarks()?;
        print_bookmarks(&bookmarks, is_json)?;
    }
    Ok(())
}

#[instrument(skip(cli, settings))]
pub fn search(cli: Cli, settings: &Settings) -> CliResult<()> {
    if let Some(Commands::Search { fts_query, is_json }) = cli.command {
        let store = open_store(settings)?;
        let bookmarks = store.search_bookmarks(&fts_query)?;
        debug!("Found {} bookmarks for {:?}", bookmarks.len(), fts_query);
        if bookmarks.is_empty() && !is_json {
            eprintln!("{}", "No bookmarks found".yellow());
            return Ok(());
        }
        print_bookmarks(&bookmarks, is_json)?;
    }
    Ok(())
}

#[instrument(skip(cli, settings))]
pub fn delete(cli: Cli, settings: &Settings) -> CliResult<()> {
    if let Some(Commands::Delete { ids }) = cli.command {
        let store = open_store(settings)?;
        let mut missing = Vec::new();
        for id in ids {
            if store.delete_bookmark(id)? {
                eprintln!("Deleted: {}", id);
            } else {
                missing.push(id);
            }
        }
        if !missing.is_empty() {
            return Err(CliError::InvalidInput(format!(
                "No bookmark with id: {:?}",
                missing
            )));
        }
    }
    Ok(())
}

fn print_bookmarks(bookmarks: &[Bookmark], is_json: bool) -> CliResult<()> {
    if is_json {
        println!("{}", serde_json::to_string_pretty(bookmarks)?);
        return Ok(());
    }
    for bm in bookmarks {
        println!(
            "{}: {} <{}>",
            bm.id.to_string().blue(),
            bm.title.clone().green(),
            bm.url.clone().yellow()
        );
        if let Some(description) = bm.description.as_deref().filter(|d| !d.is_empty()) {
            println!("    {}", description);
        }
    }
    Ok(())
}
