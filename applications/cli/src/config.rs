/// Application configuration
use encore_core::StoredEncoding;
use encore_importer::IngestConfig;
use encore_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "encore.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Root directory of the media store
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    #[serde(default)]
    pub encoding: StoredEncoding,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `encore.toml` is read if
    /// present. `ENCORE_*` variables override both, with `__` between
    /// nesting levels (`ENCORE_STORAGE__DATABASE_URL`).
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        settings.build()?.try_deserialize()
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite://./data/encore.db".to_string()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./data/media")
}

fn default_filter() -> String {
    "encore=info,encore_cli=info,encore_importer=info,encore_playback=warn".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            media_root: default_media_root(),
            encoding: StoredEncoding::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_playback::ResourceMode;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let config = AppConfig::default();
        assert_eq!(config.storage.database_url, "sqlite://./data/encore.db");
        assert_eq!(config.storage.encoding, StoredEncoding::Raw);
        assert_eq!(config.ingest.probe_timeout_ms, 3000);
        assert_eq!(config.playback.position_update_interval_ms, 500);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[storage]
media_root = "/srv/encore"
encoding = "base64"

[ingest]
music_dir = "tracks"

[playback]
resource_mode = "in_memory"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.storage.media_root, PathBuf::from("/srv/encore"));
        assert_eq!(config.storage.encoding, StoredEncoding::Base64);
        assert_eq!(config.storage.database_url, "sqlite://./data/encore.db");
        assert_eq!(config.ingest.music_dir, "tracks");
        assert_eq!(config.ingest.probe_timeout_ms, 3000);
        assert_eq!(config.playback.resource_mode, ResourceMode::InMemory);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/encore.toml"))).is_err());
    }
}
