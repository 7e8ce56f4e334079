//! In-memory `Storage` implementation

use crate::error::Result;
use crate::storage::{Storage, TrackPredicate};
use crate::types::Track;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    kv: HashMap<String, Value>,
    tracks: HashMap<String, (Track, String)>,
    order: Vec<String>,
    liked: HashSet<String>,
}

/// Volatile storage backed by hash maps
///
/// Tracks are returned in insertion order with `liked` reflecting the like set.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// File path recorded for a track by `save_track`
    pub async fn file_path(&self, id: &str) -> Option<String> {
        self.inner
            .read()
            .await
            .tracks
            .get(id)
            .map(|(_, path)| path.clone())
    }

    /// Number of stored tracks
    pub async fn track_count(&self) -> usize {
        self.inner.read().await.tracks.len()
    }
}

impl Inner {
    fn hydrate(&self, track: &Track) -> Track {
        let mut track = track.clone();
        track.liked = self.liked.contains(&track.id);
        track
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.read().await.kv.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.write().await;
        if value.is_null() {
            inner.kv.remove(key);
        } else {
            inner.kv.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn save_track(&self, track: &Track, file_path: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.tracks.contains_key(&track.id) {
            inner.order.push(track.id.clone());
        }
        if track.liked {
            inner.liked.insert(track.id.clone());
        }
        inner
            .tracks
            .insert(track.id.clone(), (track.clone(), file_path.to_string()));
        Ok(())
    }

    async fn get_track(&self, id: &str) -> Result<Option<Track>> {
        let inner = self.inner.read().await;
        Ok(inner.tracks.get(id).map(|(t, _)| inner.hydrate(t)))
    }

    async fn delete_track(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.tracks.remove(id);
        inner.order.retain(|existing| existing != id);
        inner.liked.remove(id);
        Ok(())
    }

    async fn add_liked(&self, id: &str) -> Result<()> {
        self.inner.write().await.liked.insert(id.to_string());
        Ok(())
    }

    async fn remove_liked(&self, id: &str) -> Result<()> {
        self.inner.write().await.liked.remove(id);
        Ok(())
    }

    async fn query_tracks(&self, predicate: &TrackPredicate) -> Result<Vec<Track>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.tracks.get(id))
            .map(|(t, _)| inner.hydrate(t))
            .filter(|t| predicate(t))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn null_clears_key() {
        let storage = MemoryStorage::new();
        storage.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), Some(json!({"a": 1})));

        storage.set("k", Value::Null).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn likes_are_reflected_on_read() {
        let storage = MemoryStorage::new();
        let track = Track::local("local-1", "T", "A", "music/local-1.mp3");
        storage.save_track(&track, "music/local-1.mp3").await.unwrap();

        storage.add_liked("local-1").await.unwrap();
        assert!(storage.get_track("local-1").await.unwrap().unwrap().liked);
        assert_eq!(storage.liked_tracks().await.unwrap().len(), 1);

        storage.remove_liked("local-1").await.unwrap();
        assert!(!storage.get_track("local-1").await.unwrap().unwrap().liked);
    }

    #[tokio::test]
    async fn query_preserves_insertion_order() {
        let storage = MemoryStorage::new();
        for id in ["c", "a", "b"] {
            let track = Track::local(id, id, "A", format!("music/{id}.mp3"));
            storage.save_track(&track, &track.source_ref).await.unwrap();
        }
        let ids: Vec<_> = storage
            .all_tracks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);

        storage.delete_track("a").await.unwrap();
        assert_eq!(storage.track_count().await, 2);
        assert!(storage.get_track("a").await.unwrap().is_none());
    }
}
