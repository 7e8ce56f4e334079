//! Audio backend abstraction
//!
//! One trait for both audio outputs. The engine owns two instances (local
//! files and remote previews) and is the only component that commands them.

use crate::error::Result;
use crate::resources::PlayableSource;
use async_trait::async_trait;
use encore_core::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Which of the two backends an event or command concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Output for locally stored files
    Local,
    /// Output for streamed previews
    Remote,
}

impl BackendKind {
    /// Both kinds, local first
    pub const ALL: [BackendKind; 2] = [BackendKind::Local, BackendKind::Remote];

    /// Backend that plays `track`
    pub fn for_track(track: &Track) -> Self {
        if track.is_local {
            Self::Local
        } else {
            Self::Remote
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// Lifecycle events a backend reports to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Source metadata parsed; duration in seconds
    MetadataReady { duration: f64 },

    /// Throttled position report in seconds
    PositionChanged { seconds: f64 },

    /// Playback reached the end of the source
    Ended,

    /// Opaque platform failure
    Error { reason: String },
}

/// Sending half handed to backends via [`AudioBackend::attach`]
pub type BackendEventSink = mpsc::UnboundedSender<(BackendKind, BackendEvent)>;

/// Receiving half drained by the engine's owner
pub type BackendEventStream = mpsc::UnboundedReceiver<(BackendKind, BackendEvent)>;

/// One platform audio output
///
/// `load` always fully replaces the previous source. Positions and durations
/// are in seconds; `set_position` clamps out-of-range values.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Route lifecycle events to `sink`, tagged with `kind`
    fn attach(&self, kind: BackendKind, sink: BackendEventSink);

    /// Load a new source, replacing any previous one
    async fn load(&self, source: &PlayableSource) -> Result<()>;

    /// Start or continue playback
    async fn play(&self) -> Result<()>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;

    /// Move the playhead
    async fn set_position(&self, seconds: f64) -> Result<()>;

    /// Current playhead position
    fn position(&self) -> f64;

    /// Duration of the loaded source (0 when unknown)
    fn duration(&self) -> f64;
}

/// Rate limiter for position reports
///
/// Backends feed every underlying tick through [`PositionThrottle::should_emit`]
/// and only forward the ones it lets through.
#[derive(Debug, Clone)]
pub struct PositionThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl PositionThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether a report at `now` should go out
    pub fn should_emit(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Forget the last report so the next tick is emitted
    pub fn reset(&mut self) {
        self.last = None;
    }
}
