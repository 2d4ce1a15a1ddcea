// src/domain/repositories/repository.rs

use crate::domain::bookmark::{Bookmark, BookmarkDraft};
use crate::domain::error::DomainResult;
use crate::domain::tag::{BookmarkTag, Tag};

/*
   Repository Interface
   Every method is one self-contained transaction: it either commits all of
   its effects, search index included, or none of them.
   Absent rows are reported as false/None/empty, never as errors.
*/
/// Repository trait for bookmark persistence operations
pub trait BookmarkRepository: std::fmt::Debug + Send + Sync {
    /// Insert a bookmark and return its new id
    fn add(&self, draft: &BookmarkDraft) -> DomainResult<i32> {
        self.add_tagged(draft, &[])
    }

    /// Insert a bookmark together with its tags, created as needed.
    ///
    /// One transaction: on any failure neither the bookmark nor a tag is written.
    fn add_tagged(&self, draft: &BookmarkDraft, tag_names: &[String]) -> DomainResult<i32>;

    /// Insert a bookmark from its individual fields
    fn add_bookmark(
        &self,
        title: &str,
        url: &str,
        description: Option<&str>,
        content_snippet: Option<&str>,
        source: Option<&str>,
    ) -> DomainResult<i32> {
        let draft = BookmarkDraft {
            title: title.to_string(),
            url: url.to_string(),
            description: description.map(str::to_string),
            content_snippet: content_snippet.map(str::to_string),
            source: source.map(str::to_string),
        };
        self.add(&draft)
    }

    /// Get all bookmarks in insertion order
    fn get_bookmarks(&self) -> DomainResult<Vec<Bookmark>>;

    /// Get a bookmark by its ID
    fn get_bookmark(&self, id: i32) -> DomainResult<Option<Bookmark>>;

    /// Get a bookmark by its URL
    fn get_bookmark_by_url(&self, url: &str) -> DomainResult<Option<Bookmark>>;

    /// Check if bookmark exists by URL
    fn exists_by_url(&self, url: &str) -> DomainResult<bool> {
        self.get_bookmark_by_url(url).map(|found| found.is_some())
    }

    /// Number of stored bookmarks
    fn count(&self) -> DomainResult<usize>;

    /// Replace the caller owned fields of a bookmark
    fn update_bookmark(&self, id: i32, draft: &BookmarkDraft) -> DomainResult<bool>;

    /// Delete a bookmark together with its tag links and index entry
    fn delete_bookmark(&self, id: i32) -> DomainResult<bool>;

    /// Full-text search, most relevant first
    fn search_bookmarks(&self, query: &str) -> DomainResult<Vec<Bookmark>>;

    /// Get or create a tag by name
    fn add_tag(
        &self,
        name: &str,
        category: Option<&str>,
        auto_generated: bool,
    ) -> DomainResult<Tag>;

    /// All tags with the number of bookmarks carrying them
    fn get_tags(&self) -> DomainResult<Vec<(Tag, usize)>>;

    fn delete_tag(&self, id: i32) -> DomainResult<bool>;

    /// Link a tag to a bookmark, overwriting the confidence of an existing link
    fn tag_bookmark(
        &self,
        bookmark_id: i32,
        tag_id: i32,
        confidence: Option<f64>,
    ) -> DomainResult<bool>;

    fn untag_bookmark(&self, bookmark_id: i32, tag_id: i32) -> DomainResult<bool>;

    fn get_bookmark_tags(&self, bookmark_id: i32) -> DomainResult<Vec<BookmarkTag>>;

    fn get_bookmarks_by_tag(&self, name: &str) -> DomainResult<Vec<Bookmark>>;
}
