//! Headless audio backend driven by the tokio clock
//!
//! Produces no sound. Time advances with the runtime clock, so under a paused
//! test runtime playback is fully deterministic.

use crate::backend::{AudioBackend, BackendEvent, BackendEventSink, BackendKind, PositionThrottle};
use crate::error::{PlaybackError, Result};
use crate::resources::PlayableSource;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

const DEFAULT_DURATION_SECS: f64 = 180.0;

#[derive(Default)]
struct ClockState {
    source_key: Option<String>,
    duration: f64,
    /// Position at `playing_since` (or the frozen position when paused)
    anchor: f64,
    playing_since: Option<Instant>,
    /// Bumped whenever the playhead is re-anchored; stale tickers exit
    epoch: u64,
    ticker: Option<JoinHandle<()>>,
    sink: Option<(BackendKind, BackendEventSink)>,
}

impl ClockState {
    fn position_at(&self, now: Instant) -> f64 {
        let position = match self.playing_since {
            Some(since) => self.anchor + now.duration_since(since).as_secs_f64(),
            None => self.anchor,
        };
        if self.duration > 0.0 {
            position.min(self.duration)
        } else {
            position
        }
    }

    /// Freeze the playhead and invalidate the running ticker
    fn halt(&mut self, now: Instant) {
        self.anchor = self.position_at(now);
        self.playing_since = None;
        self.epoch += 1;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn emit(&self, event: BackendEvent) {
        if let Some((kind, sink)) = &self.sink {
            // Receiver gone means the engine is shutting down
            let _ = sink.send((*kind, event));
        }
    }
}

struct Inner {
    state: Mutex<ClockState>,
    durations: Mutex<HashMap<String, f64>>,
    failing: Mutex<HashSet<String>>,
    default_duration: f64,
    tick: Duration,
    report_interval: Duration,
    load_latency: Duration,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn duration_for(&self, key: &str) -> f64 {
        let durations = self.durations.lock().unwrap_or_else(PoisonError::into_inner);
        durations
            .iter()
            .filter(|(pattern, _)| key.ends_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map_or(self.default_duration, |(_, secs)| *secs)
    }

    fn fails(&self, key: &str) -> bool {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        failing.iter().any(|pattern| key.ends_with(pattern.as_str()))
    }
}

/// Software-clock [`AudioBackend`]
///
/// Durations are looked up per source key suffix (a file name or URL tail),
/// falling back to a default.
#[derive(Clone)]
pub struct ClockBackend {
    inner: Arc<Inner>,
}

impl Default for ClockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ClockState::default()),
                durations: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
                default_duration: DEFAULT_DURATION_SECS,
                tick: Duration::from_millis(100),
                report_interval: Duration::from_millis(500),
                load_latency: Duration::ZERO,
            }),
        }
    }

    fn configure(mut self, f: impl FnOnce(&mut Inner)) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            f(inner);
        }
        self
    }

    /// Duration reported for sources without an explicit one
    #[must_use]
    pub fn with_default_duration(self, seconds: f64) -> Self {
        self.configure(|inner| inner.default_duration = seconds.max(0.0))
    }

    /// Interval between position reports
    #[must_use]
    pub fn with_report_interval(self, interval: Duration) -> Self {
        self.configure(|inner| inner.report_interval = interval)
    }

    /// Simulated time taken by `load`
    #[must_use]
    pub fn with_load_latency(self, latency: Duration) -> Self {
        self.configure(|inner| inner.load_latency = latency)
    }

    /// Report `seconds` for any source whose key ends with `key_suffix`
    pub fn set_duration(&self, key_suffix: impl Into<String>, seconds: f64) {
        self.inner
            .durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key_suffix.into(), seconds.max(0.0));
    }

    /// Make `load` fail for sources whose key ends with `key_suffix`
    pub fn fail_source(&self, key_suffix: impl Into<String>) {
        self.inner
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key_suffix.into());
    }

    /// Simulate a platform failure while playing
    pub fn raise_error(&self, reason: impl Into<String>) {
        let mut state = self.inner.state();
        state.halt(Instant::now());
        state.emit(BackendEvent::Error {
            reason: reason.into(),
        });
    }

    /// Key of the loaded source
    pub fn loaded_source(&self) -> Option<String> {
        self.inner.state().source_key.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state().playing_since.is_some()
    }

    fn spawn_ticker(&self, state: &mut ClockState) {
        let weak = Arc::downgrade(&self.inner);
        let epoch = state.epoch;
        let tick = self.inner.tick;
        let mut throttle = PositionThrottle::new(self.inner.report_interval);

        state.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let mut state = inner.state();
                if state.epoch != epoch {
                    break;
                }

                let now = Instant::now();
                let position = state.position_at(now);
                let finished = state.duration > 0.0 && position >= state.duration;

                if throttle.should_emit(now) || finished {
                    state.emit(BackendEvent::PositionChanged { seconds: position });
                }
                if finished {
                    trace!("Clock reached end of {:?}", state.source_key);
                    state.anchor = state.duration;
                    state.playing_since = None;
                    state.epoch += 1;
                    state.ticker = None;
                    state.emit(BackendEvent::Ended);
                    break;
                }
            }
        }));
    }
}

#[async_trait]
impl AudioBackend for ClockBackend {
    fn attach(&self, kind: BackendKind, sink: BackendEventSink) {
        self.inner.state().sink = Some((kind, sink));
    }

    async fn load(&self, source: &PlayableSource) -> Result<()> {
        let key = source.key();
        {
            let mut state = self.inner.state();
            state.halt(Instant::now());
            state.source_key = None;
            state.anchor = 0.0;
            state.duration = 0.0;
        }

        if !self.inner.load_latency.is_zero() {
            tokio::time::sleep(self.inner.load_latency).await;
        }

        if self.inner.fails(&key) {
            return Err(PlaybackError::backend(format!("cannot decode {key}")));
        }

        let duration = self.inner.duration_for(&key);
        let mut state = self.inner.state();
        debug!("Clock backend loaded {} ({:.1}s)", key, duration);
        state.source_key = Some(key);
        state.duration = duration;
        state.emit(BackendEvent::MetadataReady { duration });
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let mut state = self.inner.state();
        if state.source_key.is_none() {
            return Err(PlaybackError::backend("no source loaded"));
        }
        if state.playing_since.is_some() {
            return Ok(());
        }
        let now = Instant::now();
        state.halt(now);
        if state.duration > 0.0 && state.anchor >= state.duration {
            state.anchor = 0.0;
        }
        state.playing_since = Some(now);
        self.spawn_ticker(&mut state);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.inner.state().halt(Instant::now());
        Ok(())
    }

    async fn set_position(&self, seconds: f64) -> Result<()> {
        let mut state = self.inner.state();
        let now = Instant::now();
        let was_playing = state.playing_since.is_some();
        state.halt(now);

        let mut target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if state.duration > 0.0 {
            target = target.min(state.duration);
        }
        state.anchor = target;

        if was_playing {
            state.playing_since = Some(now);
            self.spawn_ticker(&mut state);
        }
        Ok(())
    }

    fn position(&self) -> f64 {
        self.inner.state().position_at(Instant::now())
    }

    fn duration(&self) -> f64 {
        self.inner.state().duration
    }
}
