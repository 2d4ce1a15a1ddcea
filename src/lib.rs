// src/lib.rs
#![crate_type = "lib"]
#![crate_name = "bmstore"]

// Core modules
pub mod domain;
pub mod infrastructure;

// CLI modules
pub mod cli;
pub mod config;
pub mod exitcode;
pub mod util;

pub use config::{StoreConfig, StoreConfigBuilder};
pub use domain::bookmark::{Bookmark, BookmarkDraft};
pub use domain::error::{DomainError, DomainResult};
pub use domain::repositories::repository::BookmarkRepository;
pub use domain::tag::{BookmarkTag, Tag};
pub use infrastructure::repositories::sqlite::repository::SqliteBookmarkRepository;

/// The SQLite backed bookmark store.
pub type BookmarkStore = SqliteBookmarkRepository;
