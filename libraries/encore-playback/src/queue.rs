//! Ordered play queue with a wraparound cursor

use encore_core::Track;

/// Ordered track list plus a cursor
///
/// The cursor is always within bounds while the queue is non-empty. The
/// list is only ever replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    cursor: usize,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracks and cursor
    ///
    /// Returns `false` (leaving the queue untouched) when `start` is out of
    /// bounds for a non-empty list.
    pub fn replace(&mut self, tracks: Vec<Track>, start: usize) -> bool {
        if !tracks.is_empty() && start >= tracks.len() {
            return false;
        }
        self.tracks = tracks;
        self.cursor = if self.tracks.is_empty() { 0 } else { start };
        true
    }

    /// Advance with wraparound, returning the new current track
    pub fn advance(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.tracks.len();
        self.tracks.get(self.cursor)
    }

    /// Step back with wraparound, returning the new current track
    pub fn retreat(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let len = self.tracks.len();
        self.cursor = (self.cursor + len - 1) % len;
        self.tracks.get(self.cursor)
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
