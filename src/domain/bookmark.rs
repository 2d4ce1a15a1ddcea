// src/domain/bookmark.rs
use crate::domain::error::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A stored bookmark as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bookmark {
    pub id: i32,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content_snippet: Option<String>,
    pub source: Option<String>,
    pub date_added: DateTime<Utc>,
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} <{}>", self.id, self.title, self.url)
    }
}

/// The caller supplied part of a bookmark, used for inserts and updates.
///
/// `id` and `date_added` are owned by the store and cannot be set here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub content_snippet: Option<String>,
    pub source: Option<String>,
}

impl BookmarkDraft {
    pub fn new<S: Into<String>>(title: S, url: S) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content_snippet<S: Into<String>>(mut self, snippet: S) -> Self {
        self.content_snippet = Some(snippet.into());
        self
    }

    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Checks that `title` and `url` are not blank. Values are kept as given.
    pub fn validated(&self) -> DomainResult<Self> {
        if self.url.trim().is_empty() {
            return Err(DomainError::InvalidBookmark(
                "URL cannot be empty".to_string(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(DomainError::InvalidBookmark(format!(
                "Title cannot be empty for {}",
                self.url
            )));
        }

        Ok(self.clone())
    }
}
