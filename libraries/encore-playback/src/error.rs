//! Error types for playback

use encore_core::EncoreError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// An operation needs a current track and there is none
    #[error("No track selected")]
    NoTrackSelected,

    /// The file behind a track could not be located or read
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Opaque failure reported by an audio backend
    #[error("Backend playback error: {0}")]
    BackendPlayback(String),

    /// Queue start index past the end of the queue
    #[error("Queue index out of bounds: {0}")]
    QueueIndexOutOfBounds(usize),

    /// Storage collaborator failure
    #[error(transparent)]
    Storage(#[from] EncoreError),
}

impl PlaybackError {
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendPlayback(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
