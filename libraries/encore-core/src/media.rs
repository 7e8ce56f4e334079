//! Durable storage for imported audio bytes

use crate::error::{EncoreError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// How a media store keeps file bytes at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredEncoding {
    /// Bytes are stored as-is
    #[default]
    Raw,
    /// Bytes are stored as base64 text; readers must decode
    Base64,
}

/// Durable file storage for imported tracks
///
/// Paths are relative to the store root (e.g. `music/local-1.mp3`).
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist `bytes` under `path`, returning a URI for the stored file
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<String>;

    /// Read the stored representation of `path` (see [`MediaStore::encoding`])
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Whether `path` exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Remove `path`. Removing a missing file is not an error.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Native filesystem path a media layer can open directly, if any
    fn native_path(&self, path: &str) -> Option<PathBuf>;

    /// Encoding of bytes returned by [`MediaStore::read`]
    fn encoding(&self) -> StoredEncoding;
}

/// In-memory media store
///
/// Has no native paths, so playback always goes through an in-memory handle.
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
    encoding: StoredEncoding,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes with the given encoding
    pub fn with_encoding(encoding: StoredEncoding) -> Self {
        Self {
            files: RwLock::default(),
            encoding,
        }
    }

    /// Number of stored files
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<String> {
        if path.is_empty() {
            return Err(EncoreError::invalid_input("empty media path"));
        }
        let stored = match self.encoding {
            StoredEncoding::Raw => bytes.to_vec(),
            StoredEncoding::Base64 => STANDARD.encode(bytes).into_bytes(),
        };
        self.files.write().await.insert(path.to_string(), stored);
        Ok(format!("memory://{path}"))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| EncoreError::not_found("File", path))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.files.read().await.contains_key(path))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.files.write().await.remove(path);
        Ok(())
    }

    fn native_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    fn encoding(&self) -> StoredEncoding {
        self.encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_remove() {
        let store = MemoryMediaStore::new();
        let uri = store.write("music/a.mp3", b"abc").await.unwrap();

        assert_eq!(uri, "memory://music/a.mp3");
        assert_eq!(store.read("music/a.mp3").await.unwrap(), b"abc");
        assert!(store.native_path("music/a.mp3").is_none());

        store.remove("music/a.mp3").await.unwrap();
        store.remove("music/a.mp3").await.unwrap();
        assert!(!store.exists("music/a.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn base64_store_returns_encoded_text() {
        let store = MemoryMediaStore::with_encoding(StoredEncoding::Base64);
        store.write("music/b.ogg", b"hello").await.unwrap();

        let stored = store.read("music/b.ogg").await.unwrap();
        assert_eq!(stored, b"aGVsbG8=");
        assert_eq!(store.encoding(), StoredEncoding::Base64);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let store = MemoryMediaStore::new();
        let err = store.read("music/none.mp3").await.unwrap_err();
        assert!(matches!(err, EncoreError::NotFound { .. }));
    }
}
