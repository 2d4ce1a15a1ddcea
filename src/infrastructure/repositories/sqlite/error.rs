// src/infrastructure/repositories/sqlite/error.rs

use diesel::r2d2;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::domain::error::DomainError;

#[derive(Error, Debug)]
pub enum SqliteRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DieselError),

    #[error("Diesel connection error: {0}")]
    ConnectionError(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    ConnectionPoolError(String),

    #[error("Cannot set up connection pool: {0}")]
    PoolInitError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    /// A database failure while opening the store: configuring, migrating or
    /// reconciling the search index.
    #[error("{context}: {source}")]
    SetupError {
        context: String,
        #[source]
        source: DieselError,
    },

    #[error("Database file not found: {0}")]
    DatabaseMissing(String),

    #[error("Bookmark already exists: {0}")]
    DuplicateUrl(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
}

pub type SqliteResult<T> = Result<T, SqliteRepositoryError>;

impl From<r2d2::Error> for SqliteRepositoryError {
    fn from(err: r2d2::Error) -> Self {
        SqliteRepositoryError::ConnectionPoolError(err.to_string())
    }
}

impl SqliteRepositoryError {
    /// Marks a raw database failure as happening while the store was being opened
    pub fn during_setup(self, context: &str) -> Self {
        match self {
            SqliteRepositoryError::DatabaseError(source) => SqliteRepositoryError::SetupError {
                context: context.to_string(),
                source,
            },
            other => other,
        }
    }
}

/// SQLite gave up waiting for a lock ("database is locked" / "database table is locked")
pub fn is_busy(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(_, info) => is_busy_message(info.message()),
        _ => false,
    }
}

/// Migration harness errors only carry the SQLite message
pub fn is_busy_message(msg: &str) -> bool {
    msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("database is busy")
}

pub fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Errors raised by FTS5 while parsing a MATCH expression
pub fn is_query_syntax_error(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(_, info) => {
            let msg = info.message();
            msg.starts_with("fts5:")
                || msg.contains("syntax error")
                || msg.starts_with("no such column")
                || msg.contains("unterminated string")
                || msg.contains("malformed MATCH expression")
        }
        _ => false,
    }
}

impl From<SqliteRepositoryError> for DomainError {
    fn from(err: SqliteRepositoryError) -> Self {
        match err {
            SqliteRepositoryError::DuplicateUrl(url) => DomainError::DuplicateBookmark(url),
            SqliteRepositoryError::InvalidQuery(msg) => DomainError::InvalidQuery(msg),
            SqliteRepositoryError::DatabaseError(e) if is_busy(&e) => {
                DomainError::StorageBusy(e.to_string())
            }
            SqliteRepositoryError::DatabaseError(e) => DomainError::Storage(e.to_string()),
            // Checkout only fails once every pooled connection stayed busy past the timeout
            SqliteRepositoryError::ConnectionPoolError(e) => DomainError::StorageBusy(e),
            SqliteRepositoryError::PoolInitError(e) => DomainError::StorageUnavailable(e),
            SqliteRepositoryError::ConnectionError(e) => {
                DomainError::StorageUnavailable(format!("Database connection error: {}", e))
            }
            SqliteRepositoryError::IoError(e) => {
                DomainError::StorageUnavailable(format!("IO error: {}", e))
            }
            SqliteRepositoryError::SetupError { context, source } if is_busy(&source) => {
                DomainError::StorageBusy(format!("{}: {}", context, source))
            }
            SqliteRepositoryError::SetupError { context, source } => {
                DomainError::StorageUnavailable(format!("{}: {}", context, source))
            }
            SqliteRepositoryError::MigrationError(e) if is_busy_message(&e) => {
                DomainError::StorageBusy(format!("Migration error: {}", e))
            }
            SqliteRepositoryError::MigrationError(e) => {
                DomainError::StorageUnavailable(format!("Migration error: {}", e))
            }
            SqliteRepositoryError::DatabaseMissing(path) => {
                DomainError::StorageUnavailable(format!("Database file not found: {}", path))
            }
        }
    }
}
