//! Media player facade
//!
//! Wires the engine, the queue controller and the backend event pump
//! together. This is what a UI layer holds on to.

use crate::backend::{AudioBackend, BackendEventStream};
use crate::controller::QueueController;
use crate::engine::{BackendReaction, PlaybackEngine};
use crate::error::Result;
use crate::state::StateHub;
use crate::types::PlaybackConfig;
use encore_core::{MediaStore, Storage, Track};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Engine + queue + event pump
///
/// Must be created inside a tokio runtime.
pub struct MediaPlayer {
    engine: PlaybackEngine,
    controller: Arc<QueueController>,
    pump: JoinHandle<()>,
}

impl MediaPlayer {
    pub fn new(
        config: PlaybackConfig,
        storage: Arc<dyn Storage>,
        media: Arc<dyn MediaStore>,
        local: Arc<dyn AudioBackend>,
        remote: Arc<dyn AudioBackend>,
    ) -> Self {
        let (engine, events) = PlaybackEngine::new(config, storage, media, local, remote);
        let controller = Arc::new(QueueController::new(engine.clone()));
        let pump = tokio::spawn(pump_backend_events(Arc::downgrade(&controller), events));
        Self {
            engine,
            controller,
            pump,
        }
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn queue(&self) -> &QueueController {
        &self.controller
    }

    /// Observable state
    pub fn state(&self) -> Arc<StateHub> {
        self.engine.state()
    }

    // ===== Transport =====

    pub async fn play(&self, track: Track) -> Result<()> {
        self.engine.play(track).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.engine.pause().await
    }

    pub async fn resume(&self, position: Option<f64>) -> Result<()> {
        self.engine.resume(position).await
    }

    pub async fn toggle_play(&self) -> Result<()> {
        self.engine.toggle_play().await
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        self.engine.seek(seconds).await
    }

    pub async fn pause_and_reset(&self) -> Result<()> {
        self.engine.pause_and_reset().await
    }

    pub async fn clear_current_track(&self) -> Result<()> {
        self.engine.clear_current_track().await
    }

    // ===== Queue =====

    pub async fn set_queue(&self, tracks: Vec<Track>, start: usize) -> Result<()> {
        self.controller.set_queue(tracks, start).await
    }

    pub async fn next(&self) -> Result<()> {
        self.controller.next().await
    }

    pub async fn previous(&self) -> Result<()> {
        self.controller.previous().await
    }

    // ===== Library =====

    pub async fn toggle_like(&self, track: &mut Track) -> Result<bool> {
        self.engine.toggle_like(track).await
    }

    pub async fn restore_last_track(&self) -> Result<Option<Track>> {
        self.engine.restore_last_track().await
    }

    pub async fn verify_local_track(&self, id: &str) -> bool {
        self.engine.verify_local_track(id).await
    }
}

impl Drop for MediaPlayer {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Feed backend events to the engine and advance the queue on track end
async fn pump_backend_events(controller: Weak<QueueController>, mut events: BackendEventStream) {
    while let Some((kind, event)) = events.recv().await {
        let Some(controller) = controller.upgrade() else {
            break;
        };
        let reaction = controller.engine().handle_backend_event(kind, event).await;
        if reaction == BackendReaction::AdvanceQueue {
            if let Err(e) = controller.next().await {
                warn!("Advancing to next track failed: {}", e);
            }
        }
    }
    debug!("Backend event pump stopped");
}
