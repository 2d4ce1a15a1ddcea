// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Bookmark store with full-text search
pub struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Print the default configuration and exit
    #[arg(long = "generate-config")]
    pub generate_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a bookmark
    Add {
        url: String,
        title: String,

        #[arg(short = 'D', long = "description")]
        description: Option<String>,

        #[arg(short = 's', long = "snippet", help = "captured excerpt of the page")]
        content_snippet: Option<String>,

        #[arg(long = "source", help = "provenance, e.g. import origin")]
        source: Option<String>,

        #[arg(short = 't', long = "tags", help = "comma separated list")]
        tags: Option<String>,
    },

    /// List all bookmarks in insertion order
    List {
        #[arg(long = "json", help = "output as json")]
        is_json: bool,
    },

    /// Full-text search: keywords, "quoted phrases", AND/OR/NOT
    Search {
        fts_query: String,

        #[arg(long = "json", help = "output as json")]
        is_json: bool,
    },

    /// Delete bookmarks by id
    Delete {
        #[arg(required = true)]
        ids: Vec<i32>,
    },

    /// Attach tags to a bookmark
    Tag {
        id: i32,

        #[arg(help = "comma separated list")]
        tags: String,

        #[arg(long = "category")]
        category: Option<String>,

        #[arg(long = "confidence", help = "marks the tags as inferred")]
        confidence: Option<f64>,
    },

    /// Show all tags with their usage count
    Tags {
        #[arg(long = "json", help = "output as json")]
        is_json: bool,
    },
}
