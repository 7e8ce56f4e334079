//! Playback engine
//!
//! Owns the session (current track, status, saved position), picks the
//! backend for each track, and is the only component that commands the two
//! backends. Every operation that drives a backend runs under one transport
//! lock; `play` additionally bumps a generation counter so an older `play`
//! that is still in flight can tell it has been superseded and back off
//! without touching state.

use crate::backend::{AudioBackend, BackendEvent, BackendEventStream, BackendKind};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::resources::{PlayableSource, ResourceManager};
use crate::state::StateHub;
use crate::types::{PlaybackConfig, PlaybackStatus};
use encore_core::{position_key, MediaStore, Storage, Track, LAST_PLAYED_KEY};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

/// Reported durations closer than this to the known one are ignored
const DURATION_TOLERANCE_SECS: f64 = 0.5;

/// An end-of-track report this far before the end is left over from a
/// previous source
const END_TOLERANCE_SECS: f64 = 0.5;

/// What the owner of the backend event stream should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendReaction {
    /// Event fully handled by the engine
    Handled,
    /// The current track finished; move the queue forward
    AdvanceQueue,
}

#[derive(Debug, Default)]
struct Session {
    generation: u64,
    track: Option<Track>,
    status: PlaybackStatus,
    saved_position: Option<f64>,
    active: Option<BackendKind>,
    /// The active backend holds this track's source
    loaded: bool,
}

struct Shared {
    config: PlaybackConfig,
    storage: Arc<dyn Storage>,
    media: Arc<dyn MediaStore>,
    resources: ResourceManager,
    local: Arc<dyn AudioBackend>,
    remote: Arc<dyn AudioBackend>,
    hub: Arc<StateHub>,
    session: Mutex<Session>,
    transport: tokio::sync::Mutex<()>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn backend(&self, kind: BackendKind) -> &Arc<dyn AudioBackend> {
        match kind {
            BackendKind::Local => &self.local,
            BackendKind::Remote => &self.remote,
        }
    }

    fn ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker().take() {
            ticker.abort();
        }
    }
}

/// Playback engine handle
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct PlaybackEngine {
    shared: Arc<Shared>,
}

impl PlaybackEngine {
    /// Create an engine over two backends
    ///
    /// Returns the stream of backend events. Whoever owns it must feed each
    /// event to [`PlaybackEngine::handle_backend_event`]
    /// ([`MediaPlayer`](crate::MediaPlayer) does this).
    pub fn new(
        config: PlaybackConfig,
        storage: Arc<dyn Storage>,
        media: Arc<dyn MediaStore>,
        local: Arc<dyn AudioBackend>,
        remote: Arc<dyn AudioBackend>,
    ) -> (Self, BackendEventStream) {
        let (sink, stream) = mpsc::unbounded_channel();
        local.attach(BackendKind::Local, sink.clone());
        remote.attach(BackendKind::Remote, sink);

        let resources = ResourceManager::new(Arc::clone(&media), config.resource_mode);
        let engine = Self {
            shared: Arc::new(Shared {
                config,
                storage,
                media,
                resources,
                local,
                remote,
                hub: Arc::new(StateHub::new()),
                session: Mutex::new(Session::default()),
                transport: tokio::sync::Mutex::new(()),
                ticker: Mutex::new(None),
            }),
        };
        (engine, stream)
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.shared
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Accessors =====

    /// Published state
    pub fn state(&self) -> Arc<StateHub> {
        Arc::clone(&self.shared.hub)
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.shared.resources
    }

    pub fn current_track(&self) -> Option<Track> {
        self.session().track.clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.session().status
    }

    pub fn saved_position(&self) -> Option<f64> {
        self.session().saved_position
    }

    /// Playhead of the active backend, or the saved position when unloaded
    pub fn position(&self) -> f64 {
        let (active, saved) = {
            let session = self.session();
            (session.active.filter(|_| session.loaded), session.saved_position)
        };
        match active {
            Some(kind) => self.shared.backend(kind).position(),
            None => saved.unwrap_or(0.0),
        }
    }

    // ===== Transport =====

    /// Play `track` from the start, replacing whatever was playing
    ///
    /// The new track is published before loading starts. Resolves `Ok` without
    /// touching state if a later `play` superseded this one.
    pub async fn play(&self, track: Track) -> Result<()> {
        let kind = BackendKind::for_track(&track);
        let generation = {
            let mut session = self.session();
            session.generation += 1;
            session.track = Some(track.clone());
            session.status = PlaybackStatus::Loading;
            session.saved_position = None;
            session.active = Some(kind);
            session.loaded = false;

            let hub = &self.shared.hub;
            hub.set_current_track(Some(track.clone()));
            hub.set_playing(false);
            hub.set_position(0.0);
            hub.set_duration(track.duration_seconds);
            hub.set_status(PlaybackStatus::Loading);
            session.generation
        };
        info!(
            "Playing '{}' by {} on {} backend",
            track.title, track.artist, kind
        );

        let _transport = self.shared.transport.lock().await;
        if self.is_stale(generation) {
            debug!("Play of {} superseded before start", track.id);
            return Ok(());
        }

        self.persist_last_played(&track).await;
        self.cleanup().await;

        let source = match self.shared.resources.materialize(kind, &track).await {
            Ok(source) => source,
            Err(e) => return self.fail(generation, e),
        };
        self.load_and_start(generation, kind, source, None).await
    }

    /// Pause the active backend and remember where it stopped
    ///
    /// No-op when nothing is loaded.
    pub async fn pause(&self) -> Result<()> {
        let _transport = self.shared.transport.lock().await;
        let (kind, track_id) = {
            let session = self.session();
            match (session.active, session.loaded, &session.track) {
                (Some(kind), true, Some(track)) => (kind, track.id.clone()),
                _ => {
                    debug!("Pause ignored: no active backend");
                    return Ok(());
                }
            }
        };

        let backend = self.shared.backend(kind);
        backend.pause().await?;
        self.stop_ticker();
        let position = backend.position();
        {
            let mut session = self.session();
            session.saved_position = Some(position);
            session.status = PlaybackStatus::Paused;

            let hub = &self.shared.hub;
            hub.set_playing(false);
            hub.set_position(position);
            hub.set_status(PlaybackStatus::Paused);
        }
        info!("Paused {} at {:.2}s", track_id, position);

        self.persist(&position_key(&track_id), Value::from(position))
            .await;
        Ok(())
    }

    /// Continue the current track
    ///
    /// Starts at `position` if given, else at the saved position, else where
    /// the backend stands. Loads the source first when the track was only
    /// restored.
    pub async fn resume(&self, position: Option<f64>) -> Result<()> {
        let _transport = self.shared.transport.lock().await;
        let (generation, track, kind, loaded, saved) = {
            let session = self.session();
            let Some(track) = session.track.clone() else {
                return Err(PlaybackError::NoTrackSelected);
            };
            let kind = session
                .active
                .unwrap_or_else(|| BackendKind::for_track(&track));
            (
                session.generation,
                track,
                kind,
                session.loaded,
                session.saved_position,
            )
        };
        let target = position.or(saved);

        if !loaded {
            debug!("Loading {} before resuming", track.id);
            {
                let mut session = self.session();
                if session.generation != generation {
                    return Ok(());
                }
                session.status = PlaybackStatus::Loading;
                session.active = Some(kind);
                self.shared.hub.set_status(PlaybackStatus::Loading);
            }
            self.cleanup().await;
            let source = match self.shared.resources.materialize(kind, &track).await {
                Ok(source) => source,
                Err(e) => return self.fail(generation, e),
            };
            return self
                .load_and_start(generation, kind, source, Some(target.unwrap_or(0.0)))
                .await;
        }

        let backend = Arc::clone(self.shared.backend(kind));
        if let Some(at) = target {
            if let Err(e) = backend.set_position(at).await {
                return self.fail(generation, e);
            }
        }
        if let Err(e) = backend.play().await {
            return self.fail(generation, e);
        }
        if self.commit_playing(generation, kind) {
            info!("Resumed {} at {:.2}s", track.id, backend.position());
        }
        Ok(())
    }

    /// Pause when playing, resume otherwise
    pub async fn toggle_play(&self) -> Result<()> {
        if self.shared.hub.is_playing() {
            self.pause().await
        } else {
            self.resume(None).await
        }
    }

    /// Move the playhead; the backend clamps out-of-range values
    pub async fn seek(&self, seconds: f64) -> Result<()> {
        let _transport = self.shared.transport.lock().await;
        let active = {
            let session = self.session();
            if session.track.is_none() {
                return Err(PlaybackError::NoTrackSelected);
            }
            session.active.filter(|_| session.loaded)
        };

        let position = match active {
            Some(kind) => {
                let backend = self.shared.backend(kind);
                backend.set_position(seconds).await?;
                backend.position()
            }
            None if seconds.is_finite() => seconds.max(0.0),
            None => 0.0,
        };

        let mut session = self.session();
        session.saved_position = Some(position);
        self.shared.hub.set_position(position);
        debug!("Seeked to {:.2}s", position);
        Ok(())
    }

    /// Stop, rewind to 0 and forget the saved position
    pub async fn pause_and_reset(&self) -> Result<()> {
        let _transport = self.shared.transport.lock().await;
        self.stop_ticker();
        let active = {
            let session = self.session();
            session.active.filter(|_| session.loaded)
        };
        if let Some(kind) = active {
            let backend = self.shared.backend(kind);
            backend.pause().await?;
            backend.set_position(0.0).await?;
        }

        let mut session = self.session();
        session.saved_position = None;
        if session.status == PlaybackStatus::Playing {
            session.status = PlaybackStatus::Paused;
        }
        let hub = &self.shared.hub;
        hub.set_playing(false);
        hub.set_position(0.0);
        hub.set_status(session.status);
        Ok(())
    }

    /// Drop the current track and return to idle
    ///
    /// Also clears the persisted last-played track.
    pub async fn clear_current_track(&self) -> Result<()> {
        self.session().generation += 1;
        let _transport = self.shared.transport.lock().await;
        self.cleanup().await;
        {
            let mut session = self.session();
            session.track = None;
            session.status = PlaybackStatus::Idle;
            session.saved_position = None;
            session.active = None;
            session.loaded = false;

            let hub = &self.shared.hub;
            hub.set_current_track(None);
            hub.set_playing(false);
            hub.set_position(0.0);
            hub.set_duration(0.0);
            hub.set_status(PlaybackStatus::Idle);
        }
        self.persist(LAST_PLAYED_KEY, Value::Null).await;
        info!("Cleared current track");
        Ok(())
    }

    // ===== Library =====

    /// Flip the liked flag of `track` through storage
    ///
    /// Returns the new flag. Independent of playback state, but the published
    /// current track is updated if it is the same track.
    pub async fn toggle_like(&self, track: &mut Track) -> Result<bool> {
        let liked = !track.liked;
        if liked {
            self.shared.storage.add_liked(&track.id).await?;
        } else {
            self.shared.storage.remove_liked(&track.id).await?;
        }
        track.liked = liked;

        let mut session = self.session();
        if let Some(current) = session.track.as_mut().filter(|t| t.id == track.id) {
            current.liked = liked;
            self.shared.hub.set_current_track(Some(current.clone()));
        }
        debug!("Track {} liked={}", track.id, liked);
        Ok(liked)
    }

    /// Prime the session with the persisted last-played track
    ///
    /// Does not start playback. Local tracks that no longer exist in storage
    /// are skipped. Storage failures are logged and treated as "nothing to
    /// restore".
    pub async fn restore_last_track(&self) -> Result<Option<Track>> {
        if self.session().track.is_some() {
            debug!("Restore skipped: a track is already current");
            return Ok(None);
        }

        let stored = match self.shared.storage.get(LAST_PLAYED_KEY).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read last played track: {}", e);
                return Ok(None);
            }
        };
        let Some(value) = stored else {
            return Ok(None);
        };
        let mut track: Track = match serde_json::from_value(value) {
            Ok(track) => track,
            Err(e) => {
                warn!("Ignoring unreadable last played track: {}", e);
                return Ok(None);
            }
        };

        if track.is_local {
            match self.shared.storage.get_track(&track.id).await {
                Ok(Some(current)) => track = current,
                Ok(None) => {
                    info!("Last played track {} no longer exists", track.id);
                    return Ok(None);
                }
                Err(e) => {
                    warn!("Could not verify last played track {}: {}", track.id, e);
                    return Ok(None);
                }
            }
        }

        let saved = match self.shared.storage.get(&position_key(&track.id)).await {
            Ok(value) => value.and_then(|v| v.as_f64()),
            Err(e) => {
                warn!("Could not read saved position of {}: {}", track.id, e);
                None
            }
        };

        {
            let mut session = self.session();
            if session.track.is_some() {
                return Ok(None);
            }
            session.generation += 1;
            session.track = Some(track.clone());
            session.status = PlaybackStatus::Idle;
            session.saved_position = saved;
            session.active = Some(BackendKind::for_track(&track));
            session.loaded = false;

            let hub = &self.shared.hub;
            hub.set_current_track(Some(track.clone()));
            hub.set_duration(track.duration_seconds);
            hub.set_position(saved.unwrap_or(0.0));
            hub.set_playing(false);
            hub.set_status(PlaybackStatus::Idle);
        }
        info!(
            "Restored {} at {:.2}s",
            track.id,
            saved.unwrap_or(0.0)
        );
        Ok(Some(track))
    }

    /// Whether a local track is known to storage and its file still exists
    pub async fn verify_local_track(&self, id: &str) -> bool {
        let track = match self.shared.storage.get_track(id).await {
            Ok(Some(track)) if track.is_local => track,
            Ok(_) => return false,
            Err(e) => {
                warn!("Could not look up {}: {}", id, e);
                return false;
            }
        };
        let Some(path) = track.stored_path() else {
            return false;
        };
        match self.shared.media.exists(path).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Could not check file of {}: {}", id, e);
                false
            }
        }
    }

    // ===== Backend events =====

    /// React to a lifecycle event from one of the backends
    ///
    /// Events from the inactive backend are ignored. Metadata and errors
    /// only count once the current source is loaded, and metadata must
    /// agree with what the backend reports for that source.
    pub async fn handle_backend_event(
        &self,
        kind: BackendKind,
        event: BackendEvent,
    ) -> BackendReaction {
        let (generation, loaded) = {
            let session = self.session();
            if session.active != Some(kind) {
                trace!("Ignoring {:?} from inactive {} backend", event, kind);
                return BackendReaction::Handled;
            }
            (session.generation, session.loaded)
        };

        match event {
            BackendEvent::PositionChanged { seconds } => {
                let session = self.session();
                if session.status == PlaybackStatus::Playing {
                    self.shared.hub.set_position(seconds);
                }
                BackendReaction::Handled
            }
            BackendEvent::MetadataReady { duration } => {
                let current = self.shared.backend(kind).duration();
                if loaded && (current - duration).abs() <= f64::EPSILON {
                    self.refine_duration(generation, duration).await;
                } else {
                    debug!("Ignoring metadata ({:.2}s) from a superseded load", duration);
                }
                BackendReaction::Handled
            }
            BackendEvent::Ended => self.on_ended(kind),
            BackendEvent::Error { reason } => {
                if loaded {
                    self.on_backend_error(generation, &reason);
                } else {
                    debug!("Ignoring backend error before load completed: {}", reason);
                }
                BackendReaction::Handled
            }
        }
    }

    fn on_ended(&self, kind: BackendKind) -> BackendReaction {
        let backend = self.shared.backend(kind);
        let duration = backend.duration();
        if duration > 0.0 && backend.position() + END_TOLERANCE_SECS < duration {
            debug!("Ignoring end-of-track left over from a previous source");
            return BackendReaction::Handled;
        }

        let mut session = self.session();
        if session.status != PlaybackStatus::Playing {
            return BackendReaction::Handled;
        }
        session.status = PlaybackStatus::Paused;
        session.saved_position = Some(0.0);
        self.stop_ticker();

        let hub = &self.shared.hub;
        hub.set_playing(false);
        hub.set_position(0.0);
        hub.set_status(PlaybackStatus::Paused);
        if let Some(track) = &session.track {
            info!("Finished {}", track.id);
        }
        BackendReaction::AdvanceQueue
    }

    fn on_backend_error(&self, generation: u64, reason: &str) {
        let mut session = self.session();
        if session.generation != generation {
            return;
        }
        error!("Playback error: {}", reason);
        session.status = PlaybackStatus::Error;
        self.stop_ticker();

        let hub = &self.shared.hub;
        hub.set_playing(false);
        hub.set_status(PlaybackStatus::Error);
        hub.emit(PlaybackEvent::Error {
            message: reason.to_string(),
        });
    }

    /// Adopt a backend-reported duration if it differs noticeably
    async fn refine_duration(&self, generation: u64, reported: f64) {
        if !reported.is_finite() || reported <= 0.0 {
            return;
        }
        let updated = {
            let mut session = self.session();
            if session.generation != generation {
                return;
            }
            let Some(track) = session.track.as_mut() else {
                return;
            };
            if (track.duration_seconds - reported).abs() <= DURATION_TOLERANCE_SECS {
                return;
            }
            info!(
                "Duration of {} refined: {:.2}s -> {:.2}s",
                track.id, track.duration_seconds, reported
            );
            track.duration_seconds = reported;
            let track = track.clone();
            self.shared.hub.set_current_track(Some(track.clone()));
            self.shared.hub.set_duration(reported);
            track
        };

        if let (true, Some(path)) = (updated.is_local, updated.local_path.as_deref()) {
            if let Err(e) = self.shared.storage.save_track(&updated, path).await {
                warn!("Failed to save refined duration of {}: {}", updated.id, e);
            }
        }
    }

    // ===== Internals =====

    fn is_stale(&self, generation: u64) -> bool {
        self.session().generation != generation
    }

    /// Load `source`, optionally seek, start playing and commit
    async fn load_and_start(
        &self,
        generation: u64,
        kind: BackendKind,
        source: PlayableSource,
        start_at: Option<f64>,
    ) -> Result<()> {
        let backend = Arc::clone(self.shared.backend(kind));
        let resources = &self.shared.resources;

        if let Err(e) = backend.load(&source).await {
            resources.release(source.handle());
            return self.fail(generation, e);
        }
        {
            let mut session = self.session();
            if session.generation != generation {
                debug!("Discarding superseded load of {}", source.key());
                resources.release(source.handle());
                return Ok(());
            }
            session.loaded = true;
        }

        if let Some(at) = start_at {
            if let Err(e) = backend.set_position(at).await {
                return self.fail(generation, e);
            }
        }
        if let Err(e) = backend.play().await {
            return self.fail(generation, e);
        }
        if !self.commit_playing(generation, kind) {
            debug!("Discarding superseded start of {}", source.key());
            resources.release(source.handle());
            return Ok(());
        }

        self.refine_duration(generation, backend.duration()).await;
        Ok(())
    }

    /// Mark the session as playing unless it was superseded
    fn commit_playing(&self, generation: u64, kind: BackendKind) -> bool {
        let mut session = self.session();
        if session.generation != generation {
            return false;
        }
        session.status = PlaybackStatus::Playing;
        session.active = Some(kind);
        session.loaded = true;
        session.saved_position = None;

        let hub = &self.shared.hub;
        hub.set_position(self.shared.backend(kind).position());
        hub.set_playing(true);
        hub.set_status(PlaybackStatus::Playing);
        self.start_ticker(kind);
        true
    }

    /// Record a failure of the current generation
    ///
    /// Superseded attempts fail quietly: their caller sees `Ok`.
    fn fail(&self, generation: u64, err: PlaybackError) -> Result<()> {
        let mut session = self.session();
        if session.generation != generation {
            debug!("Ignoring failure of superseded playback: {}", err);
            return Ok(());
        }
        error!("Playback failed: {}", err);
        session.status = PlaybackStatus::Error;
        self.stop_ticker();

        let hub = &self.shared.hub;
        hub.set_playing(false);
        hub.set_status(PlaybackStatus::Error);
        hub.emit(PlaybackEvent::Error {
            message: err.to_string(),
        });
        Err(err)
    }

    /// Stop both backends, zero them, release their resources
    async fn cleanup(&self) {
        self.stop_ticker();
        for kind in BackendKind::ALL {
            let backend = self.shared.backend(kind);
            if let Err(e) = backend.pause().await {
                debug!("Ignoring pause failure on {} backend: {}", kind, e);
            }
            if let Err(e) = backend.set_position(0.0).await {
                debug!("Ignoring rewind failure on {} backend: {}", kind, e);
            }
            self.shared.resources.release_backend(kind);
        }
        debug!("Cleaned up previous playback");
    }

    fn start_ticker(&self, kind: BackendKind) {
        let weak = Arc::downgrade(&self.shared);
        let every = self.shared.config.position_interval();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let position = shared.backend(kind).position();
                shared.hub.set_position(position);
            }
        });
        if let Some(previous) = self.shared.ticker().replace(handle) {
            previous.abort();
        }
    }

    fn stop_ticker(&self) {
        if let Some(ticker) = self.shared.ticker().take() {
            ticker.abort();
        }
    }

    /// Non-critical write: failures are logged, never surfaced
    async fn persist(&self, key: &str, value: Value) {
        if let Err(e) = self.shared.storage.set(key, value).await {
            warn!("Failed to persist {}: {}", key, e);
        }
    }

    async fn persist_last_played(&self, track: &Track) {
        match serde_json::to_value(track) {
            Ok(value) => self.persist(LAST_PLAYED_KEY, value).await,
            Err(e) => warn!("Failed to encode last played track: {}", e),
        }
    }
}
