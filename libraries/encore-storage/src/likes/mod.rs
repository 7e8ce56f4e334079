//! Liked track ids
//!
//! Likes are keyed by track id only, so a remote track can be liked
//! without being saved to the library.

use crate::error::Result;
use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};

pub(crate) async fn insert<'e, E>(executor: E, track_id: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO liked_tracks (track_id, liked_at) VALUES (?, ?) ON CONFLICT(track_id) DO NOTHING")
        .bind(track_id)
        .bind(Utc::now().to_rfc3339())
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn delete<'e, E>(executor: E, track_id: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM liked_tracks WHERE track_id = ?")
        .bind(track_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Like a track. Liking twice is a no-op.
pub async fn add(pool: &SqlitePool, track_id: &str) -> Result<()> {
    insert(pool, track_id).await
}

pub async fn remove(pool: &SqlitePool, track_id: &str) -> Result<()> {
    delete(pool, track_id).await
}

pub async fn is_liked(pool: &SqlitePool, track_id: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT track_id FROM liked_tracks WHERE track_id = ?")
            .bind(track_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}
