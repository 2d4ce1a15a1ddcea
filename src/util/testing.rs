// src/util/testing.rs

use std::env;
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing::{debug, instrument};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::config::{StoreConfig, DB_URL_ENV};
use crate::infrastructure::repositories::sqlite::repository::SqliteBookmarkRepository;

static TEST_LOGGING: OnceLock<()> = OnceLock::new();

/// Sets up test logging exactly once per process.
/// `RUST_LOG` controls the level, default `warn`.
pub fn init_test_env() {
    TEST_LOGGING.get_or_init(setup_test_logging);
}

fn setup_test_logging() {
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
        return;
    }

    let noisy_modules = ["diesel", "r2d2"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    subscriber.try_init().unwrap_or_else(|e| {
        eprintln!("Error: Failed to set up logging: {}", e);
    });
}

/// Restores `BMSTORE_DB_URL` to its previous state when dropped
#[derive(Debug, Clone)]
pub struct EnvGuard {
    db_url: Option<String>,
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvGuard {
    pub fn new() -> Self {
        Self {
            db_url: env::var(DB_URL_ENV).ok(),
        }
    }
}

impl Drop for EnvGuard {
    #[instrument(level = "trace")]
    fn drop(&mut self) {
        match &self.db_url {
            Some(val) => env::set_var(DB_URL_ENV, val),
            None => env::remove_var(DB_URL_ENV),
        }
    }
}

/// Creates a fresh store in its own temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn setup_test_db() -> (TempDir, SqliteBookmarkRepository) {
    init_test_env();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let repo = SqliteBookmarkRepository::open_with(StoreConfig::new(dir.path().join("test.db")))
        .expect("Failed to open test store");
    (dir, repo)
}
