//! Track records owned by the identity registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Identity assigned to a tracked object. Issued from 1 upwards, never reused.
pub type TrackId = u64;

/// The durable record behind one identity: last known box and sighting time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub bbox: BoundingBox,
    /// Timestamp (seconds) of the most recent matching detection.
    pub last_seen: f64,
}

impl Track {
    pub fn new(id: TrackId, bbox: BoundingBox, last_seen: f64) -> Self {
        Self { id, bbox, last_seen }
    }

    /// Seconds since this track was last seen.
    #[inline]
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.last_seen
    }

    /// Whether the track has gone unseen for at least `timeout` seconds.
    #[inline]
    pub fn is_stale(&self, now: f64, timeout: f64) -> bool {
        self.elapsed(now) >= timeout
    }

    pub(crate) fn refresh(&mut self, bbox: BoundingBox, now: f64) {
        self.bbox = bbox;
        // Timestamps only move forward even if the caller's clock stutters.
        self.last_seen = self.last_seen.max(now);
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Track(id={}, bbox=[{:.1}, {:.1}, {:.1}, {:.1}], last_seen={:.3})",
            self.id, self.bbox.x1, self.bbox.y1, self.bbox.x2, self.bbox.y2, self.last_seen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_staleness_is_inclusive() {
        let track = Track::new(1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1.0);

        assert!(!track.is_stale(2.9, 2.0));
        assert!(track.is_stale(3.0, 2.0));
        assert!(track.is_stale(10.0, 2.0));
    }

    #[test]
    fn test_track_refresh_keeps_last_seen_monotonic() {
        let mut track = Track::new(1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), 5.0);

        track.refresh(BoundingBox::new(1.0, 1.0, 2.0, 2.0), 6.0);
        assert_eq!(track.last_seen, 6.0);
        assert_eq!(track.bbox, BoundingBox::new(1.0, 1.0, 2.0, 2.0));

        track.refresh(BoundingBox::new(2.0, 2.0, 3.0, 3.0), 4.0);
        assert_eq!(track.last_seen, 6.0);
    }

    #[test]
    fn test_track_display() {
        let track = Track::new(7, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1.5);
        let shown = format!("{}", track);
        assert!(shown.contains("id=7"));
        assert!(shown.contains("last_seen=1.500"));
    }
}
