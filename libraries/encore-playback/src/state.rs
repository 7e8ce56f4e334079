//! Published playback state
//!
//! Single writer (the engine), any number of readers. Each field is a `watch`
//! channel so late subscribers see the latest value immediately; transitions
//! are additionally broadcast as [`PlaybackEvent`]s.

use crate::events::PlaybackEvent;
use crate::types::{PlaybackSnapshot, PlaybackStatus};
use encore_core::Track;
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

/// Observable playback state
#[derive(Debug)]
pub struct StateHub {
    current_track: watch::Sender<Option<Track>>,
    is_playing: watch::Sender<bool>,
    position: watch::Sender<f64>,
    duration: watch::Sender<f64>,
    status: watch::Sender<PlaybackStatus>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl Default for StateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            current_track: watch::Sender::new(None),
            is_playing: watch::Sender::new(false),
            position: watch::Sender::new(0.0),
            duration: watch::Sender::new(0.0),
            status: watch::Sender::new(PlaybackStatus::Idle),
            events,
        }
    }

    // ===== Subscriptions =====

    pub fn subscribe_current_track(&self) -> watch::Receiver<Option<Track>> {
        self.current_track.subscribe()
    }

    pub fn subscribe_is_playing(&self) -> watch::Receiver<bool> {
        self.is_playing.subscribe()
    }

    pub fn subscribe_position(&self) -> watch::Receiver<f64> {
        self.position.subscribe()
    }

    pub fn subscribe_duration(&self) -> watch::Receiver<f64> {
        self.duration.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.subscribe()
    }

    /// Transition events (lagging receivers lose the oldest ones)
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // ===== Reads =====

    pub fn current_track(&self) -> Option<Track> {
        self.current_track.borrow().clone()
    }

    pub fn is_playing(&self) -> bool {
        *self.is_playing.borrow()
    }

    pub fn position(&self) -> f64 {
        *self.position.borrow()
    }

    pub fn duration(&self) -> f64 {
        *self.duration.borrow()
    }

    pub fn status(&self) -> PlaybackStatus {
        *self.status.borrow()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current_track(),
            is_playing: self.is_playing(),
            position_seconds: self.position(),
            duration_seconds: self.duration(),
            status: self.status(),
        }
    }

    // ===== Writes (engine only) =====

    pub(crate) fn set_current_track(&self, track: Option<Track>) {
        let next_id = track.as_ref().map(|t| t.id.clone());
        let previous = self.current_track.send_replace(track);
        let previous_id = previous.map(|t| t.id);
        if previous_id != next_id {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: next_id,
                previous_track_id: previous_id,
            });
        }
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.is_playing.send_if_modified(|current| {
            let changed = *current != playing;
            *current = playing;
            changed
        });
    }

    pub(crate) fn set_position(&self, seconds: f64) {
        self.position.send_replace(seconds);
    }

    pub(crate) fn set_duration(&self, seconds: f64) {
        let previous = self.duration.send_replace(seconds);
        if (previous - seconds).abs() > f64::EPSILON {
            self.emit(PlaybackEvent::DurationChanged {
                duration_seconds: seconds,
            });
        }
    }

    pub(crate) fn set_status(&self, status: PlaybackStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            self.emit(PlaybackEvent::StatusChanged { status });
        }
    }

    pub(crate) fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn late_subscriber_sees_latest_value() {
        let hub = StateHub::new();
        hub.set_position(12.5);
        hub.set_playing(true);

        let position = hub.subscribe_position();
        assert_eq!(*position.borrow(), 12.5);
        assert!(*hub.subscribe_is_playing().borrow());
    }

    #[tokio::test]
    async fn track_change_is_broadcast_once() {
        let hub = StateHub::new();
        let mut events = hub.subscribe_events();
        let track = Track::local("local-1", "T", "A", "music/local-1.mp3");

        hub.set_current_track(Some(track.clone()));
        hub.set_current_track(Some(track));
        hub.set_current_track(None);

        assert_eq!(
            events.recv().await.unwrap(),
            PlaybackEvent::TrackChanged {
                track_id: Some("local-1".into()),
                previous_track_id: None,
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            PlaybackEvent::TrackChanged {
                track_id: None,
                previous_track_id: Some("local-1".into()),
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn status_watch_wakes_on_change() {
        let hub = StateHub::new();
        let mut status = hub.subscribe_status();

        hub.set_status(PlaybackStatus::Loading);
        status.changed().await.unwrap();
        assert_eq!(*status.borrow(), PlaybackStatus::Loading);
    }
}
