// src/infrastructure/repositories/sqlite/migration.rs
use chrono::Local;
use diesel::sql_query;
use diesel::sqlite::Sqlite;
use diesel::{RunQueryDsl, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::infrastructure::repositories::sqlite::error::{SqliteRepositoryError, SqliteResult};
use crate::infrastructure::repositories::sqlite::model::CountResult;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Bookmarks without an index entry plus index entries without a bookmark
const INDEX_DRIFT_SQL: &str = "
    SELECT
        (SELECT COUNT(*) FROM bookmarks
         WHERE id NOT IN (SELECT rowid FROM bookmarks_fts))
      + (SELECT COUNT(*) FROM bookmarks_fts
         WHERE rowid NOT IN (SELECT id FROM bookmarks)) AS n
";

/// Applies pending migrations, copying a populated database aside first when `backup` is set.
///
/// The pending set is computed and applied under one write lock, so
/// concurrent openers of the same file migrate it exactly once; the others
/// wait for the lock and then find nothing left to do.
#[instrument(skip(conn), level = "debug")]
pub fn run_pending_migrations(
    conn: &mut SqliteConnection,
    db_path: &Path,
    backup: bool,
) -> SqliteResult<()> {
    conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
        let pending = conn
            .pending_migrations(MIGRATIONS)
            .map_err(|e| harness_error("Failed to check pending migrations", e))?;

        if pending.is_empty() {
            debug!("No pending migrations to run");
            return Ok(());
        }

        for migration in &pending {
            info!("Pending migration: {}", migration.name());
        }

        if backup && has_bookmarks(conn) {
            let backup_path = backup_database(db_path)?;
            info!("Backup created at: {}", backup_path.display());
        } else {
            debug!("Skipping backup for database without bookmarks");
        }

        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| harness_error("Failed to run migrations", e))?;

        info!("Migrations completed successfully");
        Ok(())
    })
    .map_err(|e| e.during_setup("Cannot migrate database schema"))
}

/// Keeps the diesel error when the harness hands one back, so lock timeouts stay recognizable
fn harness_error(
    context: &str,
    err: Box<dyn std::error::Error + Send + Sync>,
) -> SqliteRepositoryError {
    match err.downcast::<diesel::result::Error>() {
        Ok(source) => SqliteRepositoryError::SetupError {
            context: context.to_string(),
            source: *source,
        },
        Err(err) => SqliteRepositoryError::MigrationError(format!("{}: {}", context, err)),
    }
}

/// Brings the search index back in line with the bookmarks table.
///
/// Stores written before indexing existed, or by tools that bypassed the
/// triggers, get their missing entries added and stray ones removed.
/// Returns `(added, removed)`.
#[instrument(skip_all, level = "debug")]
pub fn reconcile_search_index(conn: &mut SqliteConnection) -> SqliteResult<(usize, usize)> {
    let drift = sql_query(INDEX_DRIFT_SQL).get_result::<CountResult>(conn)?.n;
    if drift == 0 {
        debug!("Search index is consistent");
        return Ok((0, 0));
    }

    let (added, removed) = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
        let added = sql_query(
            "INSERT INTO bookmarks_fts(rowid, title, description, content_snippet)
             SELECT id, title, description, content_snippet FROM bookmarks
             WHERE id NOT IN (SELECT rowid FROM bookmarks_fts)",
        )
        .execute(conn)?;
        let removed = sql_query(
            "DELETE FROM bookmarks_fts WHERE rowid NOT IN (SELECT id FROM bookmarks)",
        )
        .execute(conn)?;
        Ok((added, removed))
    })?;

    warn!(
        "Search index was out of sync: added {} entries, removed {}",
        added, removed
    );
    Ok((added, removed))
}

/// Only a table that exists and has rows is worth a backup
fn has_bookmarks(conn: &mut SqliteConnection) -> bool {
    match sql_query("SELECT COUNT(*) AS n FROM bookmarks").get_result::<CountResult>(conn) {
        Ok(count) => {
            debug!("Database contains {} bookmark records", count.n);
            count.n > 0
        }
        Err(e) => {
            debug!("Bookmarks table doesn't exist or query failed: {}", e);
            false
        }
    }
}

fn backup_database(db_path: &Path) -> SqliteResult<PathBuf> {
    let file_name = db_path
        .file_name()
        .ok_or_else(|| {
            SqliteRepositoryError::MigrationError(
                "Could not determine database filename for backup".to_string(),
            )
        })?
        .to_string_lossy();

    let backup_name = backup_file_name(&file_name, &Local::now().format("%Y%m%d").to_string());
    let backup_path = db_path.with_file_name(backup_name);

    fs::copy(db_path, &backup_path).map_err(|e| {
        SqliteRepositoryError::MigrationError(format!("Failed to create backup: {}", e))
    })?;

    Ok(backup_path)
}

fn backup_file_name(file_name: &str, date_suffix: &str) -> String {
    match file_name.rfind('.') {
        Some(ext_pos) if ext_pos > 0 => {
            let (name, ext) = file_name.split_at(ext_pos);
            format!("{}_backup_{}{}", name, date_suffix, ext)
        }
        _ => format!("{}_backup_{}", file_name, date_suffix),
    }
}

/// Reverts and reapplies every migration. Destroys all data.
pub fn init_db(connection: &mut impl MigrationHarness<Sqlite>) -> SqliteResult<()> {
    connection.revert_all_migrations(MIGRATIONS).map_err(|e| {
        SqliteRepositoryError::MigrationError(format!("Failed to revert migrations: {}", e))
    })?;

    connection.run_pending_migrations(MIGRATIONS).map_err(|e| {
        SqliteRepositoryError::MigrationError(format!("Failed to run pending migrations: {}", e))
    })?;

    Ok(())
}
