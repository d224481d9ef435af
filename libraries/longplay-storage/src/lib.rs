//! Longplay Storage
//!
//! Local-device durable storage for the playback session: listening history,
//! per-track resume checkpoints and the key/value settings mirror.
//!
//! Two implementations of the `longplay_core` collaborator traits are provided:
//! - [`SqliteStore`]: `SQLite` database via `sqlx`, migrations embedded in the binary
//! - [`MemoryStore`]: process-local maps, used by tests and as a fallback when
//!   the database cannot be opened
//!
//! # Example
//!
//! ```rust,no_run
//! use longplay_storage::SqliteStore;
//! use longplay_core::{HistoryStore, TrackId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("sqlite://longplay.db").await?;
//! store.record_position(&TrackId::new("abc"), 42.0).await?;
//! assert_eq!(store.get_resume_position(&TrackId::new("abc")).await?, Some(42.0));
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://longplay.db`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = database_url, "creating sqlite pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    tracing::info!(url = database_url, "sqlite pool ready");
    Ok(pool)
}
