//! Main tracker implementation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace};

use crate::iou::iou_matrix;
use crate::matching::{best_match, confidence_order, get_unmatched};
use crate::registry::IdentityRegistry;
use crate::track::TrackId;
use crate::{BoundingBox, Detection, Error, Result};

fn default_iou_threshold() -> f64 {
    0.5
}

fn default_confidence_threshold() -> f64 {
    0.4
}

fn default_active_timeout() -> f64 {
    2.0
}

fn default_inactive_timeout() -> f64 {
    5.0
}

fn default_count_label() -> String {
    "rose".to_string()
}

/// Configuration for the tracker.
///
/// Every field has a default, so a partial JSON document such as
/// `{"iou_threshold": 0.3}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Minimum IoU (exclusive) for a detection to claim an existing track.
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f64,

    /// Minimum detector confidence (inclusive) admitted to the tracker.
    /// Applied by the caller, see [`TrackerConfig::admits`].
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Seconds without a sighting before an active track becomes inactive.
    #[serde(default = "default_active_timeout")]
    pub active_timeout: f64,

    /// Seconds without a sighting before an inactive track is forgotten.
    #[serde(default = "default_inactive_timeout")]
    pub inactive_timeout: f64,

    /// Key under which the aggregate count is reported.
    #[serde(default = "default_count_label")]
    pub count_label: String,
}

impl TrackerConfig {
    /// Create a configuration with the default timeouts and thresholds.
    pub fn new() -> Self {
        Self {
            iou_threshold: default_iou_threshold(),
            confidence_threshold: default_confidence_threshold(),
            active_timeout: default_active_timeout(),
            inactive_timeout: default_inactive_timeout(),
            count_label: default_count_label(),
        }
    }

    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check that thresholds and timeouts are usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(Error::InvalidConfig(format!(
                "iou_threshold must be in [0, 1], got {}",
                self.iou_threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::InvalidConfig(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }

        if !self.active_timeout.is_finite() || self.active_timeout < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "active_timeout must be a non-negative number of seconds, got {}",
                self.active_timeout
            )));
        }

        if !self.inactive_timeout.is_finite() || self.inactive_timeout < self.active_timeout {
            return Err(Error::InvalidConfig(format!(
                "inactive_timeout must be at least active_timeout ({}), got {}",
                self.active_timeout, self.inactive_timeout
            )));
        }

        Ok(())
    }

    /// Whether a detection clears the confidence floor.
    #[inline]
    pub fn admits(&self, detection: &Detection) -> bool {
        detection.confidence >= self.confidence_threshold
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one [`Tracker::reconcile`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The input detections in descending confidence order, each with `id` set.
    pub detections: Vec<Detection>,

    /// Objects currently counted: active plus inactive tracks.
    pub count: usize,

    /// Detections that claimed an active track.
    pub matched: usize,

    /// Detections that brought an inactive track back.
    pub reactivated: usize,

    /// Detections that received a brand-new id.
    pub minted: usize,
}

/// Object tracker.
///
/// Keeps stable identities for detections across frames by greedy IoU
/// matching against the tracks held in its [`IdentityRegistry`]. Time is
/// supplied by the caller; calls must be sequential with non-decreasing
/// `now`.
#[derive(Debug, Clone)]
pub struct Tracker {
    /// Tracker configuration.
    pub config: TrackerConfig,

    registry: IdentityRegistry,
}

impl Tracker {
    /// Create a new tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            registry: IdentityRegistry::new(),
        })
    }

    /// Reconcile one frame of detections against the current tracks.
    ///
    /// Steps, in order:
    /// 1. expire stale active tracks, then purge stale inactive ones;
    /// 2. sort detections by confidence (descending, stable);
    /// 3. for each detection, claim the best unclaimed active track above the
    ///    IoU threshold, otherwise the best unclaimed inactive one;
    /// 4. mint new ids for everything left over.
    ///
    /// IoU is measured against the track boxes as they were when the match
    /// pass started. A track claimed by one detection cannot be claimed by
    /// another in the same call, so no id appears twice in the result. Ties
    /// between tracks go to the lowest id.
    ///
    /// # Arguments
    /// * `detections` - Detections for this frame, already confidence-filtered
    /// * `now` - Frame timestamp in seconds
    pub fn reconcile(&mut self, detections: Vec<Detection>, now: f64) -> Reconciliation {
        let span = debug_span!("reconcile", now, detections = detections.len());
        let _enter = span.enter();

        // Expire before purge so a long-absent track passes through inactive
        // and is forgotten within the same call.
        self.registry.expire(now, self.config.active_timeout);
        self.registry.purge(now, self.config.inactive_timeout);

        let order = confidence_order(&detections);
        let mut slots: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
        let mut sorted: Vec<Detection> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let (active_ids, active_boxes) = snapshot(self.registry.active().map(|t| (t.id, t.bbox)));
        let (inactive_ids, inactive_boxes) =
            snapshot(self.registry.inactive().map(|t| (t.id, t.bbox)));

        let candidate_boxes: Vec<BoundingBox> = sorted.iter().map(|det| det.bbox).collect();
        let active_iou = iou_matrix(&candidate_boxes, &active_boxes);
        let inactive_iou = iou_matrix(&candidate_boxes, &inactive_boxes);

        let mut active_claimed = vec![false; active_ids.len()];
        let mut inactive_claimed = vec![false; inactive_ids.len()];
        let mut matched_dets = Vec::new();
        let mut matched = 0;
        let mut reactivated = 0;

        let threshold = self.config.iou_threshold;
        for (det_idx, det) in sorted.iter_mut().enumerate() {
            // Active tracks always take priority over inactive ones.
            if let Some((col, overlap)) = best_match(&active_iou, det_idx, &active_claimed, threshold) {
                let id = active_ids[col];
                active_claimed[col] = true;
                self.registry.refresh_active(id, det.bbox, now);
                det.id = Some(id);
                matched_dets.push(det_idx);
                matched += 1;
                trace!(det_idx, id, overlap, "matched active track");
                continue;
            }

            if let Some((col, overlap)) =
                best_match(&inactive_iou, det_idx, &inactive_claimed, threshold)
            {
                let id = inactive_ids[col];
                inactive_claimed[col] = true;
                self.registry.reactivate(id, det.bbox, now);
                det.id = Some(id);
                matched_dets.push(det_idx);
                reactivated += 1;
                trace!(det_idx, id, overlap, "matched inactive track");
            }
        }

        let unmatched = get_unmatched(sorted.len(), &matched_dets);
        let minted = unmatched.len();
        for det_idx in unmatched {
            let det = &mut sorted[det_idx];
            det.id = Some(self.registry.mint(det.bbox, now));
        }

        let count = self.registry.count();
        debug!(matched, reactivated, minted, count, "frame reconciled");

        Reconciliation {
            detections: sorted,
            count,
            matched,
            reactivated,
            minted,
        }
    }

    /// Objects currently counted (active plus inactive).
    pub fn count(&self) -> usize {
        self.registry.count()
    }

    /// Total number of ids issued over this tracker's lifetime.
    pub fn total_object_count(&self) -> u64 {
        self.registry.next_id() - 1
    }

    /// Read-only view of the identity registry.
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }
}

fn snapshot(tracks: impl Iterator<Item = (TrackId, BoundingBox)>) -> (Vec<TrackId>, Vec<BoundingBox>) {
    tracks.unzip()
}
