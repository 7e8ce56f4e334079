//! Filesystem media store

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use encore_core::{EncoreError, MediaStore, Result, StoredEncoding};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// `MediaStore` rooted at a directory on disk
///
/// With [`StoredEncoding::Raw`] files are playable straight from disk and
/// `native_path` returns their location. Base64-stored files must be
/// decoded first, so they report no native path.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    encoding: StoredEncoding,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encoding: StoredEncoding::Raw,
        }
    }

    pub fn with_encoding(mut self, encoding: StoredEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a store-relative path to a location under the root
    ///
    /// Absolute paths and `..` components are rejected.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !valid {
            return Err(EncoreError::invalid_input(format!(
                "media path must be relative: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match self.encoding {
            StoredEncoding::Raw => tokio::fs::write(&target, bytes).await?,
            StoredEncoding::Base64 => tokio::fs::write(&target, STANDARD.encode(bytes)).await?,
        }

        debug!("Wrote {} bytes to {}", bytes.len(), target.display());
        let absolute = tokio::fs::canonicalize(&target).await?;
        Ok(format!("file://{}", absolute.display()))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EncoreError::not_found("File", path)),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn native_path(&self, path: &str) -> Option<PathBuf> {
        match self.encoding {
            StoredEncoding::Raw => self.resolve(path).ok(),
            StoredEncoding::Base64 => None,
        }
    }

    fn encoding(&self) -> StoredEncoding {
        self.encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn raw_roundtrip_with_native_path() {
        let dir = TempDir::new().unwrap();
        let store = FsMediaStore::new(dir.path());

        let uri = store.write("music/a.mp3", b"ID3").await.unwrap();

        assert!(uri.starts_with("file://"));
        assert!(uri.ends_with("music/a.mp3"));
        assert!(store.exists("music/a.mp3").await.unwrap());
        assert_eq!(store.read("music/a.mp3").await.unwrap(), b"ID3");
        assert_eq!(
            store.native_path("music/a.mp3"),
            Some(dir.path().join("music/a.mp3"))
        );
    }

    #[tokio::test]
    async fn base64_store_writes_text() {
        let dir = TempDir::new().unwrap();
        let store = FsMediaStore::new(dir.path()).with_encoding(StoredEncoding::Base64);

        store.write("a.ogg", &[0xff, 0x00, 0x10]).await.unwrap();

        assert_eq!(store.read("a.ogg").await.unwrap(), b"/wAQ");
        assert_eq!(store.encoding(), StoredEncoding::Base64);
        assert!(store.native_path("a.ogg").is_none());
    }

    #[tokio::test]
    async fn missing_files() {
        let dir = TempDir::new().unwrap();
        let store = FsMediaStore::new(dir.path());

        assert!(!store.exists("nope.mp3").await.unwrap());
        assert!(matches!(
            store.read("nope.mp3").await.unwrap_err(),
            EncoreError::NotFound { .. }
        ));
        store.remove("nope.mp3").await.unwrap();
    }

    #[tokio::test]
    async fn remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let store = FsMediaStore::new(dir.path());
        store.write("x.wav", b"RIFF").await.unwrap();

        store.remove("x.wav").await.unwrap();

        assert!(!store.exists("x.wav").await.unwrap());
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FsMediaStore::new(dir.path().join("root"));

        for path in ["../outside.mp3", "/etc/passwd", ""] {
            assert!(matches!(
                store.write(path, b"x").await.unwrap_err(),
                EncoreError::InvalidInput(_)
            ));
        }
        assert!(store.native_path("../x.mp3").is_none());
    }
}
