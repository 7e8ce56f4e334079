//! Shared fixtures for playback integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use encore_core::{
    EncoreError, MediaStore, MemoryMediaStore, MemoryStorage, Storage, Track, TrackPredicate,
};
use encore_playback::{ClockBackend, MediaPlayer, PlaybackConfig};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// `MemoryStorage` that counts like calls and can be told to fail writes
#[derive(Default)]
pub struct RecordingStorage {
    inner: MemoryStorage,
    pub add_liked_calls: AtomicUsize,
    pub remove_liked_calls: AtomicUsize,
    pub fail_kv_writes: AtomicBool,
}

impl RecordingStorage {
    pub fn failing_kv_writes() -> Self {
        let storage = Self::default();
        storage.fail_kv_writes.store(true, Ordering::SeqCst);
        storage
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn get(&self, key: &str) -> encore_core::Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> encore_core::Result<()> {
        if self.fail_kv_writes.load(Ordering::SeqCst) {
            return Err(EncoreError::storage("disk full"));
        }
        self.inner.set(key, value).await
    }

    async fn save_track(&self, track: &Track, file_path: &str) -> encore_core::Result<()> {
        self.inner.save_track(track, file_path).await
    }

    async fn get_track(&self, id: &str) -> encore_core::Result<Option<Track>> {
        self.inner.get_track(id).await
    }

    async fn delete_track(&self, id: &str) -> encore_core::Result<()> {
        self.inner.delete_track(id).await
    }

    async fn add_liked(&self, id: &str) -> encore_core::Result<()> {
        self.add_liked_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.add_liked(id).await
    }

    async fn remove_liked(&self, id: &str) -> encore_core::Result<()> {
        self.remove_liked_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_liked(id).await
    }

    async fn query_tracks(&self, predicate: &TrackPredicate) -> encore_core::Result<Vec<Track>> {
        self.inner.query_tracks(predicate).await
    }
}

pub struct Harness {
    pub player: MediaPlayer,
    pub storage: Arc<RecordingStorage>,
    pub media: Arc<MemoryMediaStore>,
    pub local: ClockBackend,
    pub remote: ClockBackend,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(
            Arc::new(RecordingStorage::default()),
            Arc::new(MemoryMediaStore::new()),
            ClockBackend::new(),
        )
    }

    pub fn with(
        storage: Arc<RecordingStorage>,
        media: Arc<MemoryMediaStore>,
        local: ClockBackend,
    ) -> Self {
        init_tracing();
        let remote = ClockBackend::new();
        let player = MediaPlayer::new(
            PlaybackConfig::default(),
            storage.clone(),
            media.clone(),
            Arc::new(local.clone()),
            Arc::new(remote.clone()),
        );
        Self {
            player,
            storage,
            media,
            local,
            remote,
        }
    }

    /// Register a local track with a file in the media store
    pub async fn add_local(&self, id: &str) -> Track {
        let path = format!("music/{id}.mp3");
        self.media.write(&path, b"ID3 fake audio").await.unwrap();
        let track = Track::local(id, format!("Title {id}"), "Artist", &path);
        self.storage.save_track(&track, &path).await.unwrap();
        track
    }
}

/// Route engine logs to the test output (`RUST_LOG=encore_playback=debug`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn remote_track(id: &str) -> Track {
    Track::remote(id, format!("Remote {id}"), "Artist", format!("https://cdn.example/{id}.mp3"))
}

/// Let spawned tasks (event pump, tickers) catch up
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.05,
        "expected {expected:.3}, got {actual:.3}"
    );
}
