/// Wiring of storage, media store, importer and player
use crate::config::AppConfig;
use encore_core::{MediaStore, Storage};
use encore_importer::IngestionPipeline;
use encore_playback::{ClockBackend, MediaPlayer};
use encore_storage::{FsMediaStore, SqliteStorage};
use std::sync::Arc;
use tracing::info;

pub struct App {
    pub config: AppConfig,
    pub storage: Arc<dyn Storage>,
    pub media: Arc<dyn MediaStore>,
}

impl App {
    /// Open the configured database and media directory
    pub async fn open(config: AppConfig) -> anyhow::Result<Self> {
        if let Some(dir) = sqlite_parent_dir(&config.storage.database_url) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::create_dir_all(&config.storage.media_root).await?;

        let storage = SqliteStorage::open(&config.storage.database_url).await?;
        info!("Database ready at {}", config.storage.database_url);

        let media = FsMediaStore::new(config.storage.media_root.clone())
            .with_encoding(config.storage.encoding);

        Ok(Self::from_parts(config, Arc::new(storage), Arc::new(media)))
    }

    pub fn from_parts(
        config: AppConfig,
        storage: Arc<dyn Storage>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            config,
            storage,
            media,
        }
    }

    pub fn pipeline(&self) -> IngestionPipeline {
        IngestionPipeline::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.media),
            self.config.ingest.clone(),
        )
    }

    /// Headless player; the clock backends never produce sound
    pub fn player(&self) -> MediaPlayer {
        MediaPlayer::new(
            self.config.playback.clone(),
            Arc::clone(&self.storage),
            Arc::clone(&self.media),
            Arc::new(ClockBackend::new()),
            Arc::new(ClockBackend::new()),
        )
    }
}

/// Directory holding a `sqlite://` file database, if any
fn sqlite_parent_dir(database_url: &str) -> Option<&std::path::Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}
