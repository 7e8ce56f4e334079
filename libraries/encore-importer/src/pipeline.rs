//! Ingestion pipeline
//!
//! validate → persist bytes → derive title/artist → probe duration → save track

use crate::naming::{self, parse_file_name};
use crate::probe::{measure_duration, DurationProbe, LoftyProbe};
use crate::types::{IngestConfig, IngestFailure, IngestReport};
use crate::{ImportError, Result};
use encore_core::{MediaStore, Storage, Track};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Imports audio files into the media store and the track library
pub struct IngestionPipeline {
    storage: Arc<dyn Storage>,
    media: Arc<dyn MediaStore>,
    probe: Arc<dyn DurationProbe>,
    config: IngestConfig,
}

impl IngestionPipeline {
    pub fn new(storage: Arc<dyn Storage>, media: Arc<dyn MediaStore>, config: IngestConfig) -> Self {
        Self {
            storage,
            media,
            probe: Arc::new(LoftyProbe),
            config,
        }
    }

    /// Replace the duration probe
    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one file's bytes
    ///
    /// Size and format are checked before anything is written. If the
    /// track cannot be saved the stored file is removed again.
    pub async fn ingest(&self, bytes: Vec<u8>, file_name: &str, size_bytes: u64) -> Result<Track> {
        let size = size_bytes.max(bytes.len() as u64);
        let extension = naming::validate(file_name, size)?;

        let id = format!("local-{}", Uuid::new_v4().simple());
        let path = self.config.storage_path(&id, &extension);

        debug!("Storing {} as {}", file_name, path);
        let uri = self.media.write(&path, &bytes).await?;

        let (artist, title) = parse_file_name(file_name);
        let duration =
            measure_duration(Arc::clone(&self.probe), bytes, extension, self.config.probe_timeout())
                .await;

        let mut track = Track::local(id, title, artist, path.as_str()).with_duration(duration);
        track.source_ref = uri;

        if let Err(e) = self.storage.save_track(&track, &path).await {
            warn!("Saving track {} failed, removing {}: {}", track.id, path, e);
            if let Err(cleanup) = self.media.remove(&path).await {
                warn!("Could not remove orphaned file {}: {}", path, cleanup);
            }
            return Err(e.into());
        }

        info!(
            "Imported '{}' by {} ({:.1}s) as {}",
            track.title, track.artist, track.duration_seconds, track.id
        );
        Ok(track)
    }

    /// Ingest a file from the local filesystem
    ///
    /// The size is taken from file metadata so oversized files are never read.
    pub async fn ingest_path(&self, path: &Path) -> Result<Track> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ImportError::InvalidPath(path.display().to_string()))?;

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ImportError::InvalidPath(format!(
                "{} is not a file",
                path.display()
            )));
        }
        naming::validate(file_name, metadata.len())?;

        let bytes = tokio::fs::read(path).await?;
        self.ingest(bytes, file_name, metadata.len()).await
    }

    /// Ingest many files, continuing past individual failures
    pub async fn ingest_all(&self, paths: &[PathBuf]) -> IngestReport {
        let mut report = IngestReport::default();

        for path in paths {
            match self.ingest_path(path).await {
                Ok(track) => report.imported.push(track),
                Err(error) => {
                    warn!("Failed to import {}: {}", path.display(), error);
                    report.failed.push(IngestFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "Import finished: {} imported, {} failed",
            report.imported.len(),
            report.failed.len()
        );
        report
    }
}
