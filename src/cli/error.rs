// src/cli/error.rs
use crate::config::ConfigError;
use crate::domain::error::DomainError;
use crate::exitcode;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_) => exitcode::USAGE,
            CliError::Config(_) => exitcode::CONFIG,
            CliError::Io(_) | CliError::Json(_) => exitcode::SOFTWARE,
            CliError::Domain(e) => match e {
                DomainError::DuplicateBookmark(_) => exitcode::DUP,
                DomainError::InvalidQuery(_)
                | DomainError::InvalidBookmark(_)
                | DomainError::InvalidTag(_) => exitcode::USAGE,
                DomainError::StorageUnavailable(_) => exitcode::UNAVAILABLE,
                DomainError::StorageBusy(_) => exitcode::TEMPFAIL,
                DomainError::Storage(_) => exitcode::SOFTWARE,
            },
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
