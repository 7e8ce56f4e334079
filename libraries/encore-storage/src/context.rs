use crate::{create_memory_pool, create_pool, kv, likes, run_migrations, tracks};
use async_trait::async_trait;
use encore_core::{Result, Storage, Track, TrackPredicate};
use serde_json::Value;
use sqlx::SqlitePool;

/// `Storage` backed by `SQLite`
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Wrap an existing pool. Migrations must already have run.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and migrate it
    pub async fn open(database_url: &str) -> crate::Result<Self> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database, migrated
    pub async fn in_memory() -> crate::Result<Self> {
        let pool = create_memory_pool().await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// File path recorded for a track by `save_track`
    pub async fn file_path(&self, id: &str) -> Result<Option<String>> {
        Ok(tracks::file_path(&self.pool, id).await?)
    }

    pub async fn track_count(&self) -> Result<usize> {
        let n = tracks::count(&self.pool).await?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    pub async fn is_liked(&self, id: &str) -> Result<bool> {
        Ok(likes::is_liked(&self.pool, id).await?)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    // Key-value
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(kv::get(&self.pool, key).await?)
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        Ok(kv::set(&self.pool, key, &value).await?)
    }

    // Tracks
    async fn save_track(&self, track: &Track, file_path: &str) -> Result<()> {
        Ok(tracks::upsert(&self.pool, track, file_path).await?)
    }

    async fn get_track(&self, id: &str) -> Result<Option<Track>> {
        Ok(tracks::get_by_id(&self.pool, id).await?)
    }

    async fn delete_track(&self, id: &str) -> Result<()> {
        Ok(tracks::delete(&self.pool, id).await?)
    }

    // Likes
    async fn add_liked(&self, id: &str) -> Result<()> {
        Ok(likes::add(&self.pool, id).await?)
    }

    async fn remove_liked(&self, id: &str) -> Result<()> {
        Ok(likes::remove(&self.pool, id).await?)
    }

    async fn query_tracks(&self, predicate: &TrackPredicate) -> Result<Vec<Track>> {
        let all = tracks::get_all(&self.pool).await?;
        Ok(all.into_iter().filter(|t| predicate(t)).collect())
    }
}
