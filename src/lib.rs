//! # Rose Tracker - Online IoU Object Tracking
//!
//! Assigns stable identities to per-frame object detections using
//! bounding-box overlap, with time-based lifecycle rules deciding when an
//! identity is considered gone.
//!
//! ## Features
//!
//! - Greedy, confidence-ordered IoU matching
//! - Active/inactive track lifecycle with re-identification of recently lost objects
//! - Caller-supplied timestamps for deterministic replay
//! - Transport-agnostic frame service with a pluggable detector
//!
//! ## Example
//!
//! ```rust
//! use rose_tracker::{BoundingBox, Detection, Tracker, TrackerConfig};
//!
//! let mut tracker = Tracker::new(TrackerConfig::default()).unwrap();
//!
//! let frame = vec![Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9, "rose")];
//! let result = tracker.reconcile(frame, 0.0);
//! assert_eq!(result.detections[0].id, Some(1));
//! assert_eq!(result.count, 1);
//! ```

// Public modules
pub mod bbox;
pub mod iou;
pub mod detection;
pub mod track;
pub mod registry;
pub mod matching;
pub mod tracker;
pub mod service;

// Re-exports for convenience
pub use bbox::BoundingBox;
pub use detection::Detection;
pub use iou::{iou, iou_matrix};
pub use registry::IdentityRegistry;
pub use service::{Clock, Detector, FrameRequest, FrameResponse, FrameService, ManualClock, SystemClock};
pub use track::{Track, TrackId};
pub use tracker::{Reconciliation, Tracker, TrackerConfig};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the tracker library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid detection: {0}")]
        InvalidDetection(String),

        #[error("Invalid payload: {0}")]
        InvalidPayload(String),

        #[error("Image decode error: {0}")]
        Decode(#[from] base64::DecodeError),

        #[error("Detector error: {0}")]
        Detector(String),

        #[error("Lock poisoned: {0}")]
        LockPoisoned(&'static str),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),
    }

    /// Result type for tracker operations
    pub type Result<T> = std::result::Result<T, Error>;
}
