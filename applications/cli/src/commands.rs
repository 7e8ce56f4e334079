//! Library management commands
//!
//! Each command returns data; printing is left to the binary.

use crate::app::App;
use anyhow::{anyhow, Context};
use encore_core::{search_library, Track};
use encore_importer::{is_duplicate, scan_directories, IngestFailure};
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of `import` and `scan`
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: Vec<Track>,
    pub duplicates: Vec<PathBuf>,
    pub failed: Vec<IngestFailure>,
}

/// Restored session shown by `status`
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub track: Track,
    pub position_seconds: f64,
}

/// Import files, skipping ones whose artist/title is already in the library
pub async fn import(app: &App, paths: &[PathBuf]) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut fresh = Vec::with_capacity(paths.len());

    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if is_duplicate(app.storage.as_ref(), name).await? {
            info!("Skipping duplicate {}", path.display());
            summary.duplicates.push(path.clone());
        } else {
            fresh.push(path.clone());
        }
    }

    let report = app.pipeline().ingest_all(&fresh).await;
    summary.imported = report.imported;
    summary.failed = report.failed;
    Ok(summary)
}

/// Find audio files under `dirs` and import them
pub async fn scan(app: &App, dirs: &[PathBuf]) -> anyhow::Result<ImportSummary> {
    let found = scan_directories(dirs);
    info!("Scan found {} audio files", found.len());
    import(app, &found).await
}

/// List tracks, optionally only liked ones or those matching `query`
pub async fn list(
    app: &App,
    liked_only: bool,
    query: Option<&str>,
    limit: usize,
) -> anyhow::Result<Vec<Track>> {
    let mut tracks = match query {
        Some(query) => search_library(app.storage.as_ref(), None, query, usize::MAX).await?,
        None => app.storage.all_tracks().await?,
    };
    if liked_only {
        tracks.retain(|t| t.liked);
    }
    tracks.truncate(limit);
    Ok(tracks)
}

/// Flip the like state of a stored track, returning the new state
pub async fn toggle_like(app: &App, id: &str) -> anyhow::Result<bool> {
    let mut track = find_track(app, id).await?;
    let player = app.player();
    Ok(player.toggle_like(&mut track).await?)
}

/// Delete a track and, for local tracks, its stored file
pub async fn remove(app: &App, id: &str) -> anyhow::Result<Track> {
    let track = find_track(app, id).await?;

    if let Some(path) = track.stored_path().filter(|_| track.is_local) {
        if let Err(e) = app.media.remove(path).await {
            warn!("Could not remove file {}: {}", path, e);
        }
    }
    app.storage.delete_track(id).await?;
    info!("Removed {} ({})", track.title, track.id);
    Ok(track)
}

/// Restore the last session without starting playback
pub async fn status(app: &App) -> anyhow::Result<Option<SessionStatus>> {
    let player = app.player();
    let Some(track) = player.restore_last_track().await? else {
        return Ok(None);
    };
    let position_seconds = player.engine().saved_position().unwrap_or(0.0);
    Ok(Some(SessionStatus {
        track,
        position_seconds,
    }))
}

async fn find_track(app: &App, id: &str) -> anyhow::Result<Track> {
    app.storage
        .get_track(id)
        .await
        .with_context(|| format!("Failed to look up track {id}"))?
        .ok_or_else(|| anyhow!("No track with id {id}"))
}
