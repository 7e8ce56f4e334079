/// Track domain type
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Artist shown for local files whose name carries no artist
pub const UNKNOWN_ARTIST: &str = "Local Music";

/// Album shown for local files
pub const DEFAULT_ALBUM: &str = "My Music";

/// Artwork reference used for local files
pub const DEFAULT_ARTWORK: &str = "assets/music-bg.png";

/// Audio track
///
/// Either a remote preview (`is_local == false`, `source_ref` is the preview
/// URL) or a file registered by the importer (`is_local == true`,
/// `local_path` is the media-store path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Track duration in seconds (0 = unknown)
    pub duration_seconds: f64,

    /// Artwork reference (URL or bundled asset)
    #[serde(default)]
    pub artwork_ref: Option<String>,

    /// Remote preview URL, or a local file reference
    pub source_ref: String,

    /// Identifier in the remote catalog (empty for local-only tracks)
    #[serde(default)]
    pub remote_id: String,

    /// Whether the user liked this track
    #[serde(default)]
    pub liked: bool,

    /// Whether this track is backed by a local file
    #[serde(default)]
    pub is_local: bool,

    /// Media-store path of the local file (present iff `is_local`)
    #[serde(default)]
    pub local_path: Option<String>,
}

impl Track {
    /// Create a local track backed by a file at `local_path`
    pub fn local(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        local_path: impl Into<String>,
    ) -> Self {
        let local_path = local_path.into();
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: DEFAULT_ALBUM.to_string(),
            duration_seconds: 0.0,
            artwork_ref: Some(DEFAULT_ARTWORK.to_string()),
            source_ref: local_path.clone(),
            remote_id: String::new(),
            liked: false,
            is_local: true,
            local_path: Some(local_path),
        }
    }

    /// Create a remote track streamed from `preview_url`
    pub fn remote(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        preview_url: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            remote_id: id.clone(),
            id,
            title: title.into(),
            artist: artist.into(),
            album: String::new(),
            duration_seconds: 0.0,
            artwork_ref: None,
            source_ref: preview_url.into(),
            liked: false,
            is_local: false,
            local_path: None,
        }
    }

    /// Builder-style album setter
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// Builder-style duration setter (seconds)
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = seconds.max(0.0);
        self
    }

    /// Whether the duration has been measured
    pub fn has_known_duration(&self) -> bool {
        self.duration_seconds > 0.0
    }

    /// Get the track duration as a Duration (`None` when unknown)
    pub fn duration(&self) -> Option<Duration> {
        self.has_known_duration()
            .then(|| Duration::from_secs_f64(self.duration_seconds))
    }

    /// Path the file is stored under, falling back to `source_ref`
    ///
    /// Strips a `file://` prefix so the result can be handed to a media store.
    pub fn stored_path(&self) -> Option<&str> {
        if !self.is_local {
            return None;
        }
        let path = self
            .local_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.source_ref);
        let path = path.strip_prefix("file://").unwrap_or(path);
        (!path.is_empty()).then_some(path)
    }

    /// Lower-cased extension of the stored file, if any
    pub fn file_extension(&self) -> Option<String> {
        let path = self.stored_path()?;
        let name = path.rsplit('/').next().unwrap_or(path);
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}
