//! Device scan for audio files

use crate::naming;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Recursive directory walker that keeps supported audio files
#[derive(Debug, Clone, Default)]
pub struct FileScanner {
    follow_links: bool,
    max_depth: Option<usize>,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Audio files under `root`, sorted by path
    ///
    /// Entries that cannot be read are skipped with a warning; the rest
    /// of the tree is still walked.
    pub fn scan(&self, root: &Path) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(root).follow_links(self.follow_links);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut found = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                found.push(entry.into_path());
            }
        }

        found.sort();
        debug!("Found {} audio files under {}", found.len(), root.display());
        found
    }

    pub fn scan_all(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        roots.iter().flat_map(|root| self.scan(root)).collect()
    }
}

/// Scan several directories with default settings
pub fn scan_directories(dirs: &[PathBuf]) -> Vec<PathBuf> {
    FileScanner::new().scan_all(dirs)
}

/// Whether `path` has a supported audio extension
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(naming::is_supported_extension)
}
