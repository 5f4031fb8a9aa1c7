//! SQLite storage layer for Lexprep.
//!
//! One module per entity, each exposing free async query functions over a
//! shared pool. `save_generated_batch` in [`items`] is the one
//! multi-statement transaction; everything else is single statements.

pub mod ability;
pub mod batches;
pub mod history;
pub mod items;
pub mod llm_usage;
pub mod passages;
pub mod queue;
pub mod settings;
pub mod transfer;

use crate::config::expand_tilde;
use crate::error::StorageError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Drill handlers, the worker, and the fire-and-forget triggers all share
/// the file, so writers may collide; WAL plus a generous busy timeout
/// keeps them out of each other's way.
fn file_options(path: &str) -> Result<SqliteConnectOptions, StorageError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))
        .map_err(open_failed)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(10))
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);
    Ok(options)
}

/// Open (or create) the database at `db_path`, apply migrations, and
/// return the shared pool. `~` expands to the home directory, and missing
/// parent directories are created.
pub async fn init_db(db_path: &str) -> Result<DbPool, StorageError> {
    let path = expand_tilde(db_path);
    if let Some(dir) = std::path::Path::new(&path).parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            open_failed(sqlx::Error::Configuration(
                format!("cannot create {}: {e}", dir.display()).into(),
            ))
        })?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(15))
        .connect_with(file_options(&path)?)
        .await
        .map_err(open_failed)?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// An in-memory database for tests, already migrated. A single connection
/// keeps the memory database alive for the pool's lifetime.
#[cfg(any(test, feature = "test-helpers"))]
pub async fn init_test_db() -> Result<DbPool, StorageError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(open_failed)?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(open_failed)?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|source| StorageError::Migration { source })
}

fn open_failed(source: sqlx::Error) -> StorageError {
    StorageError::Connection { source }
}
