use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use diesel::{Connection, QueryResult};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::error::{SqliteRepositoryError, SqliteResult};
use super::migration::{reconcile_search_index, run_pending_migrations};
use crate::config::StoreConfig;

pub type ConnectionPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// r2d2 rejects a zero checkout timeout
const MIN_CHECKOUT_TIMEOUT: Duration = Duration::from_millis(100);

/// Per-connection settings applied right after a connection is established.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub busy_timeout: Duration,
}

impl ConnectionOptions {
    pub fn apply(&self, conn: &mut SqliteConnection) -> QueryResult<()> {
        // foreign_keys is per connection and off by default: cascades depend on it
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
    }
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        self.apply(conn).map_err(r2d2::Error::QueryError)
    }
}

/// Open the database, bring its schema up to date and build the connection pool.
///
/// Schema work runs on a dedicated connection first so that an unusable path
/// fails right away instead of after the pool's checkout timeout.
#[instrument(level = "debug")]
pub fn init_pool(config: &StoreConfig) -> SqliteResult<ConnectionPool> {
    let database_url = config.path.to_str().ok_or_else(|| {
        SqliteRepositoryError::PoolInitError(format!(
            "Database path is not valid UTF-8: {}",
            config.path.display()
        ))
    })?;

    if database_url.is_empty() || database_url.starts_with(":memory:") {
        return Err(SqliteRepositoryError::PoolInitError(
            "In-memory databases cannot be shared by a pool, use a file path".to_string(),
        ));
    }

    if !config.create_if_missing && !config.path.exists() {
        return Err(SqliteRepositoryError::DatabaseMissing(
            config.path.display().to_string(),
        ));
    }

    let options = ConnectionOptions {
        busy_timeout: config.busy_timeout,
    };

    let mut conn = SqliteConnection::establish(database_url)?;
    options.apply(&mut conn).map_err(|e| {
        SqliteRepositoryError::from(e).during_setup("Cannot configure connection")
    })?;
    run_pending_migrations(&mut conn, &config.path, config.backup_before_migration)?;
    reconcile_search_index(&mut conn)
        .map_err(|e| e.during_setup("Cannot reconcile search index"))?;
    drop(conn);

    debug!("Initializing connection pool for: {}", database_url);
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size.max(1))
        .min_idle(Some(1))
        .connection_timeout(config.busy_timeout.max(MIN_CHECKOUT_TIMEOUT))
        .connection_customizer(Box::new(options))
        .build(manager)
        .map_err(|e| SqliteRepositoryError::PoolInitError(e.to_string()))?;

    info!("Connection pool initialized successfully");
    Ok(pool)
}
