//! Track rows
//!
//! `liked` is never read from this table; it is joined in from `liked_tracks`.

use crate::error::Result;
use crate::likes;
use chrono::Utc;
use encore_core::Track;
use sqlx::{FromRow, SqlitePool};

const SELECT_TRACKS: &str = r#"
    SELECT
        t.id, t.title, t.artist, t.album, t.duration_seconds, t.artwork_ref,
        t.source_ref, t.remote_id, t.is_local, t.local_path,
        (l.track_id IS NOT NULL) AS liked
    FROM tracks t
    LEFT JOIN liked_tracks l ON l.track_id = t.id
"#;

#[derive(Debug, FromRow)]
struct TrackRow {
    id: String,
    title: String,
    artist: String,
    album: String,
    duration_seconds: f64,
    artwork_ref: Option<String>,
    source_ref: String,
    remote_id: String,
    is_local: bool,
    local_path: Option<String>,
    liked: bool,
}

impl From<TrackRow> for Track {
    fn from(row: TrackRow) -> Self {
        Track {
            id: row.id,
            title: row.title,
            artist: row.artist,
            album: row.album,
            duration_seconds: row.duration_seconds,
            artwork_ref: row.artwork_ref,
            source_ref: row.source_ref,
            remote_id: row.remote_id,
            liked: row.liked,
            is_local: row.is_local,
            local_path: row.local_path,
        }
    }
}

/// Insert or replace a track
///
/// Replacing keeps the original insertion order. A track saved with
/// `liked = true` is also added to the likes.
pub async fn upsert(pool: &SqlitePool, track: &Track, file_path: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO tracks (
            id, title, artist, album, duration_seconds, artwork_ref,
            source_ref, remote_id, is_local, local_path, file_path,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            artist = excluded.artist,
            album = excluded.album,
            duration_seconds = excluded.duration_seconds,
            artwork_ref = excluded.artwork_ref,
            source_ref = excluded.source_ref,
            remote_id = excluded.remote_id,
            is_local = excluded.is_local,
            local_path = excluded.local_path,
            file_path = excluded.file_path,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&track.id)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(track.duration_seconds)
    .bind(&track.artwork_ref)
    .bind(&track.source_ref)
    .bind(&track.remote_id)
    .bind(track.is_local)
    .bind(&track.local_path)
    .bind(file_path)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    if track.liked {
        likes::insert(&mut *tx, &track.id).await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Track>> {
    let sql = format!("{SELECT_TRACKS} WHERE t.id = ?");
    let row = sqlx::query_as::<_, TrackRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Track::from))
}

/// All tracks in insertion order
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Track>> {
    let sql = format!("{SELECT_TRACKS} ORDER BY t.rowid");
    let rows = sqlx::query_as::<_, TrackRow>(&sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(Track::from).collect())
}

/// Remove a track and its like
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    likes::delete(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(())
}

/// File path recorded when the track was saved
pub async fn file_path(pool: &SqlitePool, id: &str) -> Result<Option<String>> {
    let path: Option<(String,)> = sqlx::query_as("SELECT file_path FROM tracks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(path.map(|(p,)| p))
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
