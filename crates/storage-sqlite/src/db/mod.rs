//! Connection pool, migrations, and the serialized write actor.

use std::path::Path;
use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::{Connection, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

use cardmint_core::errors::{DatabaseError, Error, Result};

use crate::errors::StorageError;

mod write_actor;
pub use write_actor::{spawn_writer, WriteHandle};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const DB_FILE_NAME: &str = "cardmint.db";

/// Pragmas applied to every pooled connection.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA foreign_keys = ON; \
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Ensure the application data directory exists and return the database
/// file path inside it.
pub fn init(app_data_dir: &str) -> Result<String> {
    std::fs::create_dir_all(app_data_dir).map_err(|e| {
        Error::Database(DatabaseError::Internal(format!(
            "Failed to create app data directory '{}': {}",
            app_data_dir, e
        )))
    })?;
    let db_path = Path::new(app_data_dir).join(DB_FILE_NAME);
    Ok(db_path.to_string_lossy().to_string())
}

/// Run any pending embedded migrations.
pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = SqliteConnection::establish(db_path).map_err(|e| {
        Error::Database(DatabaseError::Internal(format!(
            "Failed to open database '{}': {}",
            db_path, e
        )))
    })?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::from(StorageError::Migration(e.to_string())))?;
    if !applied.is_empty() {
        info!("Applied {} database migration(s)", applied.len());
    }
    Ok(())
}

/// Build the r2d2 connection pool for `db_path`.
pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))?;
    Ok(Arc::new(pool))
}

/// Check out a pooled connection.
pub fn get_connection(pool: &Arc<DbPool>) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))
}

/// Run a blocking read against the pool without stalling the async runtime.
pub(crate) async fn run_read<T, F>(pool: &Arc<DbPool>, f: F) -> Result<T>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = Arc::clone(pool);
    tokio::task::spawn_blocking(move || {
        let mut conn = get_connection(&pool)?;
        f(&mut conn)
    })
    .await
    .map_err(|e| {
        Error::Database(DatabaseError::Internal(format!(
            "Read worker failed: {}",
            e
        )))
    })?
}

/// Serialize an enum to its store representation (the serde string without
/// quotes).
pub(crate) fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

/// Parse an enum from its store representation.
pub(crate) fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}

/// Parse an RFC3339 timestamp stored as TEXT.
pub(crate) fn parse_timestamp(value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
            Error::Database(DatabaseError::Internal(format!(
                "Invalid timestamp '{}': {}",
                value, e
            )))
        })
}
