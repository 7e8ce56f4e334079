//! Core types for playback

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// No current track, or a restored track that was never started
    #[default]
    Idle,

    /// Resolving and loading a source
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// The last playback attempt failed
    Error,
}

/// How local tracks are turned into playable sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceMode {
    /// Native path when the media store offers one, else an in-memory buffer
    #[default]
    Auto,

    /// Native paths only; a store without them makes local tracks unavailable
    NativePath,

    /// Always read bytes into an in-memory buffer
    InMemory,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Interval of position updates published while playing (default: 500)
    pub position_update_interval_ms: u64,

    /// Local source materialization strategy (default: Auto)
    pub resource_mode: ResourceMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            position_update_interval_ms: 500,
            resource_mode: ResourceMode::Auto,
        }
    }
}

impl PlaybackConfig {
    /// Position update interval (never zero)
    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_update_interval_ms.max(1))
    }
}

/// Point-in-time copy of the published playback state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub current_track: Option<encore_core::Track>,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub status: PlaybackStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.position_interval(), Duration::from_millis(500));
        assert_eq!(config.resource_mode, ResourceMode::Auto);
    }

    #[test]
    fn config_deserializes_partial_input() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"resource_mode": "in_memory"}"#).unwrap();
        assert_eq!(config.resource_mode, ResourceMode::InMemory);
        assert_eq!(config.position_update_interval_ms, 500);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = PlaybackConfig {
            position_update_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.position_interval(), Duration::from_millis(1));
    }
}
