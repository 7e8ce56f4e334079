//! Queue navigation on top of the engine

use crate::engine::PlaybackEngine;
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::queue::Queue;
use encore_core::Track;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Past this many seconds, "previous" restarts the current track instead
pub const RESTART_THRESHOLD_SECS: f64 = 3.0;

/// Owns the play queue and turns navigation into `play` calls
pub struct QueueController {
    engine: PlaybackEngine,
    queue: Mutex<Queue>,
}

impl QueueController {
    pub fn new(engine: PlaybackEngine) -> Self {
        Self {
            engine,
            queue: Mutex::new(Queue::new()),
        }
    }

    fn queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    /// Replace the queue and play the track at `start`
    ///
    /// An empty list clears the queue without touching playback.
    pub async fn set_queue(&self, tracks: Vec<Track>, start: usize) -> Result<()> {
        let first = {
            let mut queue = self.queue();
            if !queue.replace(tracks, start) {
                return Err(PlaybackError::QueueIndexOutOfBounds(start));
            }
            self.announce(&queue);
            queue.current().cloned()
        };
        match first {
            Some(track) => self.engine.play(track).await,
            None => {
                debug!("Queue cleared");
                Ok(())
            }
        }
    }

    /// Play the following track, wrapping to the first
    pub async fn next(&self) -> Result<()> {
        let next = {
            let mut queue = self.queue();
            let next = queue.advance().cloned();
            if next.is_some() {
                self.announce(&queue);
            }
            next
        };
        match next {
            Some(track) => self.engine.play(track).await,
            None => {
                info!("Next ignored: queue is empty");
                Ok(())
            }
        }
    }

    /// Restart the current track, or play the preceding one
    ///
    /// Restarts when more than [`RESTART_THRESHOLD_SECS`] in.
    pub async fn previous(&self) -> Result<()> {
        if self.engine.current_track().is_some()
            && self.engine.position() > RESTART_THRESHOLD_SECS
        {
            debug!("Restarting current track");
            return self.engine.seek(0.0).await;
        }

        let previous = {
            let mut queue = self.queue();
            let previous = queue.retreat().cloned();
            if previous.is_some() {
                self.announce(&queue);
            }
            previous
        };
        match previous {
            Some(track) => self.engine.play(track).await,
            None => {
                info!("Previous ignored: queue is empty");
                Ok(())
            }
        }
    }

    fn announce(&self, queue: &Queue) {
        self.engine.state().emit(PlaybackEvent::QueueChanged {
            length: queue.len(),
            index: queue.cursor(),
        });
    }

    // ===== Snapshots =====

    pub fn tracks(&self) -> Vec<Track> {
        self.queue().tracks().to_vec()
    }

    pub fn cursor(&self) -> usize {
        self.queue().cursor()
    }

    pub fn current(&self) -> Option<Track> {
        self.queue().current().cloned()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }
}
