// src/domain/error.rs
use thiserror::Error;

/// Errors surfaced by the bookmark store.
///
/// Not-found conditions are never errors: they are reported as `false`,
/// `None` or an empty result.
#[derive(Error, Debug)]
pub enum DomainError {
    /// A bookmark with this URL is already stored; nothing was written.
    #[error("Bookmark already exists: {0}")]
    DuplicateBookmark(String),

    /// The search expression does not parse as a full-text query.
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    /// The database file cannot be opened, created or migrated.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Lock contention outlasted the configured busy timeout. Safe to retry.
    #[error("Storage busy: {0}")]
    StorageBusy(String),

    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    /// Any other storage fault, for reads as well as writes.
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Transient failures that a caller may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::StorageBusy(_))
    }
}
