//! Identity registry: the id counter and the active/inactive track sets.
//!
//! The registry stores tracks and enforces the lifecycle invariants:
//!
//! - an id lives in at most one of the two sets,
//! - ids are issued in strictly increasing order and never reused,
//! - `active ∪ inactive` is exactly the set of counted objects.
//!
//! It performs no matching; that is the tracker's job.

use std::collections::BTreeMap;

use tracing::debug;

use crate::track::{Track, TrackId};
use crate::BoundingBox;

/// Owner of every [`Track`] and of the monotonic id counter.
///
/// Both sets are ordered by id, so iteration visits older identities first.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    next_id: TrackId,
    active: BTreeMap<TrackId, Track>,
    inactive: BTreeMap<TrackId, Track>,
}

impl IdentityRegistry {
    /// Create an empty registry whose first minted id is 1.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            active: BTreeMap::new(),
            inactive: BTreeMap::new(),
        }
    }

    /// Move every active track unseen for at least `active_timeout` seconds
    /// into the inactive set, keeping its box and timestamp.
    ///
    /// Returns the ids that were moved, in ascending order.
    pub fn expire(&mut self, now: f64, active_timeout: f64) -> Vec<TrackId> {
        let expired: Vec<TrackId> = self
            .active
            .values()
            .filter(|track| track.is_stale(now, active_timeout))
            .map(|track| track.id)
            .collect();

        for id in &expired {
            if let Some(track) = self.active.remove(id) {
                debug!(id = *id, elapsed = track.elapsed(now), "track expired to inactive");
                self.inactive.insert(*id, track);
            }
        }

        expired
    }

    /// Forget every inactive track unseen for at least `inactive_timeout`
    /// seconds.
    ///
    /// Returns the ids that were removed, in ascending order.
    pub fn purge(&mut self, now: f64, inactive_timeout: f64) -> Vec<TrackId> {
        let mut purged = Vec::new();
        self.inactive.retain(|&id, track| {
            let keep = !track.is_stale(now, inactive_timeout);
            if !keep {
                debug!(id, elapsed = track.elapsed(now), "inactive track forgotten");
                purged.push(id);
            }
            keep
        });
        purged
    }

    /// Allocate the next id and register a new active track for it.
    pub fn mint(&mut self, bbox: BoundingBox, now: f64) -> TrackId {
        let id = self.next_id;
        self.next_id += 1;
        self.active.insert(id, Track::new(id, bbox, now));
        debug!(id, "minted new track");
        id
    }

    /// Overwrite the box and timestamp of an active track.
    ///
    /// Returns `false` (and changes nothing) if `id` is not active.
    pub fn refresh_active(&mut self, id: TrackId, bbox: BoundingBox, now: f64) -> bool {
        match self.active.get_mut(&id) {
            Some(track) => {
                track.refresh(bbox, now);
                true
            }
            None => false,
        }
    }

    /// Move an inactive track back into the active set under the same id,
    /// refreshing its box and timestamp.
    ///
    /// Returns `false` (and changes nothing) if `id` is not inactive.
    pub fn reactivate(&mut self, id: TrackId, bbox: BoundingBox, now: f64) -> bool {
        match self.inactive.remove(&id) {
            Some(mut track) => {
                track.refresh(bbox, now);
                debug!(id, "track reactivated");
                self.active.insert(id, track);
                true
            }
            None => false,
        }
    }

    /// Number of counted objects: `|active| + |inactive|`.
    pub fn count(&self) -> usize {
        self.active.len() + self.inactive.len()
    }

    /// Active tracks, ordered by id.
    pub fn active(&self) -> impl Iterator<Item = &Track> {
        self.active.values()
    }

    /// Inactive tracks, ordered by id.
    pub fn inactive(&self) -> impl Iterator<Item = &Track> {
        self.inactive.values()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn inactive_len(&self) -> usize {
        self.inactive.len()
    }

    pub fn is_active(&self, id: TrackId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn is_inactive(&self, id: TrackId) -> bool {
        self.inactive.contains_key(&id)
    }

    /// Look up a track in either set.
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.active.get(&id).or_else(|| self.inactive.get(&id))
    }

    /// The id the next call to [`mint`](Self::mint) will return.
    pub fn next_id(&self) -> TrackId {
        self.next_id
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
