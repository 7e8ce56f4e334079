//! Encore - Storage
//!
//! `SQLite` persistence for the Encore track library and a filesystem
//! media store for imported audio files.
//!
//! # Architecture
//!
//! - `tracks`: track rows (upsert keeps insertion order)
//! - `likes`: liked track ids
//! - `kv`: JSON key-value store (last played track, resume positions)
//! - `SqliteStorage`: the `encore_core::Storage` implementation over the three
//! - `FsMediaStore`: `encore_core::MediaStore` rooted in a directory
//!
//! # Example
//!
//! ```rust,no_run
//! use encore_core::Storage;
//! use encore_storage::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = SqliteStorage::open("sqlite://encore.db").await?;
//! let liked = storage.liked_tracks().await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod media;

pub mod kv;
pub mod likes;
pub mod tracks;

pub use context::SqliteStorage;
pub use error::{Result, StorageError};
pub use media::FsMediaStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool for a file database
///
/// The file is created if missing and opened in WAL mode.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    debug!("Creating pool with URL: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create a pool over a private in-memory database
///
/// Every `SQLite` memory connection is its own database, so the pool holds
/// exactly one connection and never recycles it.
pub async fn create_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}
