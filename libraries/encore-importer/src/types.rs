//! Importer configuration and batch results

use crate::ImportError;
use encore_core::Track;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Ingestion settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory (relative to the media store root) that receives imported files
    pub music_dir: String,

    /// Upper bound for the duration probe
    pub probe_timeout_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            music_dir: "music".to_string(),
            probe_timeout_ms: 3000,
        }
    }
}

impl IngestConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Storage path for a new file: `{music_dir}/{id}.{extension}`
    pub fn storage_path(&self, id: &str, extension: &str) -> String {
        let dir = self.music_dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{id}.{extension}")
        } else {
            format!("{dir}/{id}.{extension}")
        }
    }
}

/// A file that could not be ingested
#[derive(Debug)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: ImportError,
}

/// Outcome of ingesting a batch of files
#[derive(Debug, Default)]
pub struct IngestReport {
    pub imported: Vec<Track>,
    pub failed: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.imported.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.music_dir, "music");
        assert_eq!(config.probe_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: IngestConfig = serde_json::from_str(r#"{"music_dir":"library/"}"#).unwrap();
        assert_eq!(config.probe_timeout_ms, 3000);
        assert_eq!(config.storage_path("local-1", "mp3"), "library/local-1.mp3");
    }

    #[test]
    fn empty_music_dir_stores_at_root() {
        let config = IngestConfig {
            music_dir: String::new(),
            ..IngestConfig::default()
        };
        assert_eq!(config.storage_path("local-1", "ogg"), "local-1.ogg");
    }
}
