//! Playable source materialization and transient handle tracking

use crate::backend::BackendKind;
use crate::error::{PlaybackError, Result};
use crate::types::ResourceMode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use encore_core::{MediaStore, StoredEncoding, Track};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Identifier of an in-memory audio buffer handed to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(Uuid);

impl ResourceHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// Something an [`AudioBackend`](crate::AudioBackend) can load
#[derive(Debug, Clone, PartialEq)]
pub enum PlayableSource {
    /// File the platform media layer opens directly
    NativePath(PathBuf),

    /// Decoded bytes held in memory until released
    Memory {
        handle: ResourceHandle,
        /// Media-store path the bytes came from
        origin: String,
        mime: &'static str,
        bytes: Arc<[u8]>,
    },

    /// Remote preview URL, passed through unchanged
    Remote(String),
}

impl PlayableSource {
    /// Transient handle backing this source, if any
    pub fn handle(&self) -> Option<&ResourceHandle> {
        match self {
            Self::Memory { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// Stable description of where the audio comes from
    pub fn key(&self) -> String {
        match self {
            Self::NativePath(path) => path.display().to_string(),
            Self::Memory { origin, .. } => origin.clone(),
            Self::Remote(url) => url.clone(),
        }
    }
}

/// MIME type for a supported audio extension
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "opus" => "audio/opus",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Default)]
struct Registry {
    live: HashSet<ResourceHandle>,
    slots: HashMap<BackendKind, ResourceHandle>,
}

/// Converts tracks into playable sources and owns the transient handles
///
/// At most one live handle is bound to each backend: materializing for a
/// backend first releases whatever that backend held.
pub struct ResourceManager {
    media: Arc<dyn MediaStore>,
    mode: ResourceMode,
    registry: Mutex<Registry>,
}

impl ResourceManager {
    pub fn new(media: Arc<dyn MediaStore>, mode: ResourceMode) -> Self {
        Self {
            media,
            mode,
            registry: Mutex::new(Registry::default()),
        }
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve `track` into a source for the `kind` backend
    pub async fn materialize(&self, kind: BackendKind, track: &Track) -> Result<PlayableSource> {
        self.release_backend(kind);

        if !track.is_local {
            Url::parse(&track.source_ref).map_err(|e| {
                PlaybackError::source_unavailable(format!(
                    "invalid preview URL for {}: {}",
                    track.id, e
                ))
            })?;
            return Ok(PlayableSource::Remote(track.source_ref.clone()));
        }

        let path = track.stored_path().ok_or_else(|| {
            PlaybackError::source_unavailable(format!("track {} has no local path", track.id))
        })?;

        let exists = self.media.exists(path).await.map_err(|e| {
            PlaybackError::source_unavailable(format!("cannot stat {}: {}", path, e))
        })?;
        if !exists {
            return Err(PlaybackError::source_unavailable(format!(
                "file not found: {}",
                path
            )));
        }

        if self.mode != ResourceMode::InMemory {
            if let Some(native) = self.media.native_path(path) {
                debug!("Using native path for {}: {}", track.id, native.display());
                return Ok(PlayableSource::NativePath(native));
            }
            if self.mode == ResourceMode::NativePath {
                return Err(PlaybackError::source_unavailable(format!(
                    "no native path for {}",
                    path
                )));
            }
        }

        let stored = self.media.read(path).await.map_err(|e| {
            PlaybackError::source_unavailable(format!("cannot read {}: {}", path, e))
        })?;
        let bytes = match self.media.encoding() {
            StoredEncoding::Raw => stored,
            StoredEncoding::Base64 => decode_base64(&stored).map_err(|e| {
                PlaybackError::source_unavailable(format!("corrupt data in {}: {}", path, e))
            })?,
        };
        if bytes.is_empty() {
            return Err(PlaybackError::source_unavailable(format!(
                "empty file: {}",
                path
            )));
        }

        let handle = ResourceHandle::new();
        {
            let mut registry = self.registry();
            registry.live.insert(handle);
            registry.slots.insert(kind, handle);
        }
        let mime = mime_for_extension(&track.file_extension().unwrap_or_default());
        debug!(
            "Created {} ({}, {} bytes) for {}",
            handle,
            mime,
            bytes.len(),
            track.id
        );

        Ok(PlayableSource::Memory {
            handle,
            origin: path.to_string(),
            mime,
            bytes: bytes.into(),
        })
    }

    /// Release a handle. Safe on `None` and on already-released handles.
    pub fn release(&self, handle: Option<&ResourceHandle>) {
        let Some(handle) = handle else {
            return;
        };
        let mut registry = self.registry();
        if registry.live.remove(handle) {
            debug!("Released {}", handle);
        }
        registry.slots.retain(|_, bound| bound != handle);
    }

    /// Release whatever handle `kind` currently holds
    pub fn release_backend(&self, kind: BackendKind) {
        let mut registry = self.registry();
        if let Some(handle) = registry.slots.remove(&kind) {
            if registry.live.remove(&handle) {
                debug!("Released {} held by {} backend", handle, kind);
            }
        }
    }

    /// Handle currently bound to `kind`
    pub fn handle_for(&self, kind: BackendKind) -> Option<ResourceHandle> {
        self.registry().slots.get(&kind).copied()
    }

    pub fn is_live(&self, handle: &ResourceHandle) -> bool {
        self.registry().live.contains(handle)
    }

    /// Number of handles not yet released
    pub fn live_count(&self) -> usize {
        self.registry().live.len()
    }
}

fn decode_base64(stored: &[u8]) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let text: Vec<u8> = stored
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    // Tolerate data URLs ("data:audio/mpeg;base64,....")
    let payload = match text.iter().position(|b| *b == b',') {
        Some(comma) if text.starts_with(b"data:") => &text[comma + 1..],
        _ => &text[..],
    };
    STANDARD.decode(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::MemoryMediaStore;

    async fn store_with(encoding: StoredEncoding, path: &str, bytes: &[u8]) -> Arc<dyn MediaStore> {
        let store = MemoryMediaStore::with_encoding(encoding);
        store.write(path, bytes).await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn remote_url_passes_through() {
        let manager = ResourceManager::new(Arc::new(MemoryMediaStore::new()), ResourceMode::Auto);
        let track = Track::remote("r1", "T", "A", "https://cdn.example/p.mp3");

        let source = manager.materialize(BackendKind::Remote, &track).await.unwrap();
        assert_eq!(source, PlayableSource::Remote("https://cdn.example/p.mp3".into()));
        assert_eq!(manager.live_count(), 0);
    }

    #[tokio::test]
    async fn invalid_remote_url_is_unavailable() {
        let manager = ResourceManager::new(Arc::new(MemoryMediaStore::new()), ResourceMode::Auto);
        let track = Track::remote("r1", "T", "A", "not a url");

        let err = manager.materialize(BackendKind::Remote, &track).await.unwrap_err();
        assert!(matches!(err, PlaybackError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn base64_store_is_decoded() {
        let media = store_with(StoredEncoding::Base64, "music/a.mp3", b"ID3 audio").await;
        let manager = ResourceManager::new(media, ResourceMode::Auto);
        let track = Track::local("a", "T", "A", "music/a.mp3");

        let source = manager.materialize(BackendKind::Local, &track).await.unwrap();
        match &source {
            PlayableSource::Memory { bytes, mime, .. } => {
                assert_eq!(&bytes[..], b"ID3 audio");
                assert_eq!(*mime, "audio/mpeg");
            }
            other => panic!("expected memory source, got {other:?}"),
        }
        assert_eq!(manager.live_count(), 1);
        manager.release(source.handle());
        assert_eq!(manager.live_count(), 0);
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        assert_eq!(decode_base64(b"data:audio/mpeg;base64,aGk=").unwrap(), b"hi");
        assert_eq!(decode_base64(b"aG\nk=").unwrap(), b"hi");
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let manager = ResourceManager::new(Arc::new(MemoryMediaStore::new()), ResourceMode::Auto);
        let track = Track::local("gone", "T", "A", "music/gone.mp3");

        let err = manager.materialize(BackendKind::Local, &track).await.unwrap_err();
        assert!(matches!(err, PlaybackError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_file_is_unavailable() {
        let media = store_with(StoredEncoding::Raw, "music/e.wav", b"").await;
        let manager = ResourceManager::new(media, ResourceMode::Auto);
        let track = Track::local("e", "T", "A", "music/e.wav");

        assert!(manager.materialize(BackendKind::Local, &track).await.is_err());
        assert_eq!(manager.live_count(), 0);
    }

    #[tokio::test]
    async fn native_mode_without_native_paths_fails() {
        let media = store_with(StoredEncoding::Raw, "music/a.mp3", b"x").await;
        let manager = ResourceManager::new(media, ResourceMode::NativePath);
        let track = Track::local("a", "T", "A", "music/a.mp3");

        assert!(manager.materialize(BackendKind::Local, &track).await.is_err());
    }

    #[tokio::test]
    async fn materialize_replaces_previous_handle_for_backend() {
        let store = MemoryMediaStore::new();
        store.write("music/a.mp3", b"a").await.unwrap();
        store.write("music/b.mp3", b"b").await.unwrap();
        let manager = ResourceManager::new(Arc::new(store), ResourceMode::Auto);

        let first = manager
            .materialize(BackendKind::Local, &Track::local("a", "A", "X", "music/a.mp3"))
            .await
            .unwrap();
        let second = manager
            .materialize(BackendKind::Local, &Track::local("b", "B", "X", "music/b.mp3"))
            .await
            .unwrap();

        assert_eq!(manager.live_count(), 1);
        assert!(!manager.is_live(first.handle().unwrap()));
        assert_eq!(manager.handle_for(BackendKind::Local).as_ref(), second.handle());

        // Releasing twice, or nothing, is harmless
        manager.release(first.handle());
        manager.release(None);
        manager.release_backend(BackendKind::Local);
        manager.release_backend(BackendKind::Local);
        assert_eq!(manager.live_count(), 0);
    }
}
