use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::sql_types::{BigInt, Bool, Integer, Nullable, Text};
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use std::fmt;

use crate::domain::bookmark::{Bookmark, BookmarkDraft};
use crate::domain::tag::Tag;
use crate::infrastructure::repositories::sqlite::schema::{bookmark_tags, bookmarks, tags};

#[derive(Queryable, Selectable, Identifiable, QueryableByName, Clone, Debug)]
#[diesel(table_name = bookmarks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbBookmark {
    pub id: i32,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub date_added: NaiveDateTime,
    pub content_snippet: Option<String>,
    pub source: Option<String>,
}

impl From<DbBookmark> for Bookmark {
    fn from(db: DbBookmark) -> Self {
        Bookmark {
            id: db.id,
            url: db.url,
            title: db.title,
            description: db.description,
            content_snippet: db.content_snippet,
            source: db.source,
            date_added: DateTime::<Utc>::from_naive_utc_and_offset(db.date_added, Utc),
        }
    }
}

/// New bookmark for insertion
#[derive(Insertable, Debug)]
#[diesel(table_name = bookmarks)]
pub struct NewBookmark<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub date_added: NaiveDateTime,
    pub content_snippet: Option<&'a str>,
    pub source: Option<&'a str>,
}

impl<'a> NewBookmark<'a> {
    pub fn from_draft(draft: &'a BookmarkDraft, date_added: NaiveDateTime) -> Self {
        Self {
            url: &draft.url,
            title: &draft.title,
            description: draft.description.as_deref(),
            date_added,
            content_snippet: draft.content_snippet.as_deref(),
            source: draft.source.as_deref(),
        }
    }
}

impl fmt::Display for NewBookmark<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url: {}, title: {}, description: {}, snippet: {} chars, source: {}, date_added: {}",
            self.url,
            self.title,
            self.description.unwrap_or("None"),
            self.content_snippet.map_or(0, |s| s.chars().count()),
            self.source.unwrap_or("None"),
            self.date_added
        )
    }
}

/// Changes for updating a bookmark; `date_added` is deliberately absent.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = bookmarks)]
#[diesel(treat_none_as_null = true)]
pub struct DbBookmarkChanges<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub content_snippet: Option<&'a str>,
    pub source: Option<&'a str>,
}

impl<'a> From<&'a BookmarkDraft> for DbBookmarkChanges<'a> {
    fn from(draft: &'a BookmarkDraft) -> Self {
        Self {
            url: &draft.url,
            title: &draft.title,
            description: draft.description.as_deref(),
            content_snippet: draft.content_snippet.as_deref(),
            source: draft.source.as_deref(),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbTag {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub auto_generated: Option<bool>,
}

impl From<DbTag> for Tag {
    fn from(db: DbTag) -> Self {
        Tag {
            id: db.id,
            name: db.name,
            category: db.category,
            auto_generated: db.auto_generated.unwrap_or(false),
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tags)]
pub struct NewTag<'a> {
    pub name: &'a str,
    pub category: Option<&'a str>,
    pub auto_generated: Option<bool>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = bookmark_tags)]
pub struct NewBookmarkTag {
    pub bookmark_id: i32,
    pub tag_id: i32,
    pub confidence: Option<f64>,
}

/// Tags frequency for aggregation queries
#[derive(QueryableByName, Debug)]
pub struct TagsFrequency {
    #[diesel(sql_type = Integer)]
    pub id: i32,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub category: Option<String>,
    #[diesel(sql_type = Nullable<Bool>)]
    pub auto_generated: Option<bool>,
    #[diesel(sql_type = BigInt)]
    pub n: i64,
}

impl From<TagsFrequency> for (Tag, usize) {
    fn from(tf: TagsFrequency) -> Self {
        let tag = Tag {
            id: tf.id,
            name: tf.name,
            category: tf.category,
            auto_generated: tf.auto_generated.unwrap_or(false),
        };
        (tag, tf.n.max(0) as usize)
    }
}

#[derive(QueryableByName, Debug)]
pub struct CountResult {
    #[diesel(sql_type = BigInt)]
    pub n: i64,
}
