//! Storage trait consumed by the playback engine and the importer

use crate::error::Result;
use crate::types::Track;
use async_trait::async_trait;
use serde_json::Value;

/// Key under which the last played track is persisted
pub const LAST_PLAYED_KEY: &str = "last_played_track";

/// Key under which the resume position of a track is persisted
pub fn position_key(track_id: &str) -> String {
    format!("position_{track_id}")
}

/// Predicate used by [`Storage::query_tracks`]
pub type TrackPredicate = dyn Fn(&Track) -> bool + Send + Sync;

/// Persistent catalog and key-value store
///
/// Every operation may fail with [`crate::EncoreError::Storage`].
/// Implementations must be shareable across tasks.
#[async_trait]
pub trait Storage: Send + Sync {
    // ========================================================================
    // Key-value
    // ========================================================================

    /// Get a value, `None` when the key was never set or was cleared
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Set a value. Setting [`Value::Null`] clears the key.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    // ========================================================================
    // Tracks
    // ========================================================================

    /// Insert or replace a track together with the path of its file
    async fn save_track(&self, track: &Track, file_path: &str) -> Result<()>;

    /// Get track by ID
    async fn get_track(&self, id: &str) -> Result<Option<Track>>;

    /// Delete a track (and its like, if any)
    async fn delete_track(&self, id: &str) -> Result<()>;

    /// Mark a track as liked
    async fn add_liked(&self, id: &str) -> Result<()>;

    /// Remove a like
    async fn remove_liked(&self, id: &str) -> Result<()>;

    /// All tracks matching `predicate`
    async fn query_tracks(&self, predicate: &TrackPredicate) -> Result<Vec<Track>>;

    /// All known tracks
    async fn all_tracks(&self) -> Result<Vec<Track>> {
        self.query_tracks(&|_| true).await
    }

    /// Liked tracks only
    async fn liked_tracks(&self) -> Result<Vec<Track>> {
        self.query_tracks(&|t| t.liked).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_key_embeds_track_id() {
        assert_eq!(position_key("local-abc"), "position_local-abc");
    }
}
