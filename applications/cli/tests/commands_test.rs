//! Command tests against in-memory storage and a temporary media root

use encore_cli::commands;
use encore_cli::{App, AppConfig};
use encore_core::{position_key, MediaStore, MemoryStorage, Storage, LAST_PLAYED_KEY};
use encore_storage::FsMediaStore;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    app: App,
    storage: Arc<MemoryStorage>,
    media: Arc<FsMediaStore>,
    inbox: TempDir,
    _media_root: TempDir,
}

fn fixture() -> Fixture {
    let media_root = TempDir::new().unwrap();
    let storage = Arc::new(MemoryStorage::new());
    let media = Arc::new(FsMediaStore::new(media_root.path()));
    let app = App::from_parts(AppConfig::default(), storage.clone(), media.clone());
    Fixture {
        app,
        storage,
        media,
        inbox: TempDir::new().unwrap(),
        _media_root: media_root,
    }
}

impl Fixture {
    fn drop_file(&self, name: &str) -> PathBuf {
        let path = self.inbox.path().join(name);
        std::fs::write(&path, b"not really audio").unwrap();
        path
    }
}

#[tokio::test]
async fn import_skips_duplicates() {
    let f = fixture();
    let first = f.drop_file("Air - La Femme d'Argent.mp3");

    let summary = commands::import(&f.app, &[first.clone()]).await.unwrap();
    assert_eq!(summary.imported.len(), 1);

    let again = commands::import(&f.app, &[first.clone()]).await.unwrap();
    assert!(again.imported.is_empty());
    assert_eq!(again.duplicates, vec![first]);
    assert_eq!(f.storage.track_count().await, 1);
}

#[tokio::test]
async fn scan_imports_supported_files() {
    let f = fixture();
    f.drop_file("One.mp3");
    f.drop_file("Two.ogg");
    f.drop_file("cover.jpg");

    let summary = commands::scan(&f.app, &[f.inbox.path().to_path_buf()])
        .await
        .unwrap();

    assert_eq!(summary.imported.len(), 2);
    assert!(summary.failed.is_empty());
}

#[tokio::test]
async fn list_filters_liked_and_query() {
    let f = fixture();
    let paths = [f.drop_file("Moby - Porcelain.mp3"), f.drop_file("Bonobo - Kerala.flac")];
    let summary = commands::import(&f.app, &paths).await.unwrap();
    let bonobo = summary
        .imported
        .iter()
        .find(|t| t.artist == "Bonobo")
        .unwrap()
        .id
        .clone();

    assert_eq!(commands::list(&f.app, false, None, 10).await.unwrap().len(), 2);
    assert!(commands::list(&f.app, true, None, 10).await.unwrap().is_empty());

    assert!(commands::toggle_like(&f.app, &bonobo).await.unwrap());

    let liked = commands::list(&f.app, true, None, 10).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, bonobo);

    let found = commands::list(&f.app, false, Some("porcel"), 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].artist, "Moby");

    assert!(!commands::toggle_like(&f.app, &bonobo).await.unwrap());
}

#[tokio::test]
async fn remove_deletes_track_and_file() {
    let f = fixture();
    let summary = commands::import(&f.app, &[f.drop_file("Song.wav")])
        .await
        .unwrap();
    let track = &summary.imported[0];
    let path = track.local_path.clone().unwrap();
    assert!(f.media.exists(&path).await.unwrap());

    commands::remove(&f.app, &track.id).await.unwrap();

    assert!(!f.media.exists(&path).await.unwrap());
    assert_eq!(f.storage.get_track(&track.id).await.unwrap(), None);
    assert!(commands::remove(&f.app, &track.id).await.is_err());
}

#[tokio::test]
async fn status_restores_last_session() {
    let f = fixture();
    assert_eq!(commands::status(&f.app).await.unwrap(), None);

    let summary = commands::import(&f.app, &[f.drop_file("Band - Tune.opus")])
        .await
        .unwrap();
    let track = summary.imported[0].clone();
    f.storage
        .set(LAST_PLAYED_KEY, serde_json::to_value(&track).unwrap())
        .await
        .unwrap();
    f.storage
        .set(&position_key(&track.id), json!(42.0))
        .await
        .unwrap();

    let status = commands::status(&f.app).await.unwrap().unwrap();

    assert_eq!(status.track.id, track.id);
    assert_eq!(status.position_seconds, 42.0);
}

#[tokio::test]
async fn like_unknown_track_fails() {
    let f = fixture();
    assert!(commands::toggle_like(&f.app, "local-missing").await.is_err());
}
