//! Remote catalog records and local-first search

use crate::error::Result;
use crate::storage::Storage;
use crate::types::Track;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Track record as returned by the streaming service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl RemoteTrack {
    /// Map into a playable [`Track`]
    ///
    /// Returns `None` when the record has no preview URL.
    pub fn into_track(self) -> Option<Track> {
        let preview = self.preview_url.filter(|url| !url.is_empty())?;
        let mut track = Track::remote(self.id, self.name, self.artists.join(", "), preview)
            .with_album(self.album)
            .with_duration(self.duration_ms as f64 / 1000.0);
        track.artwork_ref = self.image_url;
        Some(track)
    }
}

/// Map a batch of records, dropping the unplayable ones
pub fn playable_tracks(records: impl IntoIterator<Item = RemoteTrack>) -> Vec<Track> {
    records
        .into_iter()
        .filter_map(RemoteTrack::into_track)
        .collect()
}

/// Remote streaming catalog
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Search the catalog for tracks
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RemoteTrack>>;
}

/// Search local tracks first, falling back to the remote catalog
///
/// Local matching is a case-insensitive substring match on title and artist.
/// Catalog failures degrade to an empty result. Storage failures propagate.
pub async fn search_library(
    storage: &dyn Storage,
    catalog: Option<&dyn RemoteCatalog>,
    query: &str,
    limit: usize,
) -> Result<Vec<Track>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let matcher = needle.clone();
    let mut local = storage
        .query_tracks(&move |t: &Track| {
            t.is_local
                && (t.title.to_lowercase().contains(&matcher)
                    || t.artist.to_lowercase().contains(&matcher))
        })
        .await?;

    if !local.is_empty() {
        debug!("Search '{}' matched {} local tracks", query, local.len());
        local.truncate(limit);
        return Ok(local);
    }

    let Some(catalog) = catalog else {
        return Ok(Vec::new());
    };

    match catalog.search(query, limit).await {
        Ok(records) => {
            let mut tracks = playable_tracks(records);
            tracks.truncate(limit);
            Ok(tracks)
        }
        Err(e) => {
            warn!("Remote search failed, showing local results only: {}", e);
            Ok(Vec::new())
        }
    }
}
