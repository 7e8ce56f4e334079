//! Pre-ingest duplicate check

use crate::naming::parse_file_name;
use encore_core::{Storage, Track};

/// Whether a local track with the same artist and title as `file_name` exists
///
/// Stored files are renamed to their track ids, so the original base
/// filename is gone after ingestion. The check instead parses `file_name`
/// with the ingestion naming convention and looks for a local track with
/// the same title and artist, ignoring case. Callers run it before `ingest`.
pub async fn is_duplicate(storage: &dyn Storage, file_name: &str) -> encore_core::Result<bool> {
    let (artist, title) = parse_file_name(file_name);
    let predicate = move |track: &Track| {
        track.is_local
            && track.title.to_lowercase() == title.to_lowercase()
            && track.artist.to_lowercase() == artist.to_lowercase()
    };

    let matches = storage.query_tracks(&predicate).await?;
    Ok(!matches.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::MemoryStorage;

    #[tokio::test]
    async fn finds_same_artist_and_title() {
        let storage = MemoryStorage::new();
        let track = Track::local("local-1", "One More Time", "Daft Punk", "music/local-1.mp3");
        storage.save_track(&track, "music/local-1.mp3").await.unwrap();

        assert!(is_duplicate(&storage, "daft punk - one more time.flac").await.unwrap());
        assert!(!is_duplicate(&storage, "Daft Punk - Aerodynamic.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn remote_tracks_do_not_count() {
        let storage = MemoryStorage::new();
        let track = Track::remote("sp-1", "Intro", "The xx", "https://cdn.example/1.mp3");
        storage.save_track(&track, "").await.unwrap();

        assert!(!is_duplicate(&storage, "The xx - Intro.mp3").await.unwrap());
    }
}
