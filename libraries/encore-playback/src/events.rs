//! Playback Events
//!
//! Broadcast alongside the watch streams so a UI can react to transitions
//! (e.g. raise a transient notification on `Error`) without diffing state.

use crate::types::PlaybackStatus;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Engine state changed
    StatusChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// Current track changed
    TrackChanged {
        /// ID of the new current track (`None` after a clear)
        track_id: Option<String>,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// Known duration of the current track changed
    DurationChanged {
        /// New duration in seconds
        duration_seconds: f64,
    },

    /// Queue replaced or cursor moved
    QueueChanged {
        /// Queue length
        length: usize,
        /// Cursor position
        index: usize,
    },

    /// Recoverable failure worth showing to the user
    Error {
        /// Error message
        message: String,
    },
}
