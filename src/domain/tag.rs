// src/domain/tag.rs
use crate::domain::error::{DomainError, DomainResult};
use serde::Serialize;
use std::fmt;

/// A named category label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    /// Inferred by the system rather than entered by a user
    pub auto_generated: bool,
}

impl Tag {
    /// Normalizes a tag name: trimmed and lowercased, no commas or whitespace.
    pub fn normalize_name<S: AsRef<str>>(name: S) -> DomainResult<String> {
        let value = name.as_ref().trim().to_lowercase();

        if value.is_empty() {
            return Err(DomainError::InvalidTag("Tag cannot be empty".to_string()));
        }

        if value.contains(',') || value.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidTag(format!(
                "Tag cannot contain commas or spaces: '{}'",
                value
            )));
        }

        Ok(value)
    }

    /// Parse a comma-separated tag string into normalized, deduplicated names
    pub fn parse_names<S: AsRef<str>>(tag_str: S) -> DomainResult<Vec<String>> {
        let mut names = Vec::new();

        for value in tag_str
            .as_ref()
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            let name = Tag::normalize_name(value)?;
            if !names.contains(&name) {
                names.push(name);
            }
        }

        Ok(names)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A tag attached to a bookmark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmarkTag {
    pub bookmark_id: i32,
    pub tag: Tag,
    /// Strength of an inferred association; `None` for manual tagging
    pub confidence: Option<f64>,
}
