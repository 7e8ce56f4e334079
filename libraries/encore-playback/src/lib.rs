//! Encore - Playback
//!
//! Playback engine for a player that mixes locally stored files with
//! streamed remote previews.
//!
//! This crate provides:
//! - `AudioBackend`: one contract for both audio outputs, plus `ClockBackend`,
//!   a headless implementation driven by the tokio clock
//! - `ResourceManager`: turns tracks into playable sources and releases the
//!   transient in-memory handles it creates
//! - `PlaybackEngine`: current track, play/pause/seek, resume positions and
//!   session restore, published through `StateHub` watch channels
//! - `QueueController`: ordered queue with wraparound next/previous
//! - `MediaPlayer`: all of the above wired together with the backend event pump
//!
//! # Example
//!
//! ```rust
//! use encore_core::{MemoryMediaStore, MemoryStorage, Track};
//! use encore_playback::{ClockBackend, MediaPlayer, PlaybackConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> encore_playback::Result<()> {
//! let player = MediaPlayer::new(
//!     PlaybackConfig::default(),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MemoryMediaStore::new()),
//!     Arc::new(ClockBackend::new()),
//!     Arc::new(ClockBackend::new()),
//! );
//!
//! let preview = Track::remote("r1", "Song", "Artist", "https://cdn.example/r1.mp3");
//! player.set_queue(vec![preview], 0).await?;
//! assert!(player.state().is_playing());
//! # Ok(())
//! # }
//! ```

mod backend;
mod clock;
mod controller;
mod engine;
mod error;
pub mod events;
mod player;
mod queue;
mod resources;
mod state;
pub mod types;

pub use backend::{
    AudioBackend, BackendEvent, BackendEventSink, BackendEventStream, BackendKind,
    PositionThrottle,
};
pub use clock::ClockBackend;
pub use controller::{QueueController, RESTART_THRESHOLD_SECS};
pub use engine::{BackendReaction, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use player::MediaPlayer;
pub use queue::Queue;
pub use resources::{mime_for_extension, PlayableSource, ResourceHandle, ResourceManager};
pub use state::StateHub;
pub use types::{PlaybackConfig, PlaybackSnapshot, PlaybackStatus, ResourceMode};
