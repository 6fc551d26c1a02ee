//! Frame service: the request/response layer around a shared [`Tracker`].
//!
//! The service is transport-agnostic. An HTTP handler (or any other
//! transport) hands it a [`FrameRequest`], and gets back a [`FrameResponse`]
//! ready to serialize. Image decoding and model inference live behind the
//! [`Detector`] trait; time comes from a [`Clock`].
//!
//! All frames go through one `Mutex<Tracker>`. The lock is held for the
//! whole reconciliation and the frame timestamp is read while holding it,
//! so concurrent callers are serialized with non-decreasing timestamps.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Detection, Error, Result, Tracker, TrackerConfig};

/// External object detector.
///
/// Receives the raw encoded image bytes of one frame and returns every
/// detection it found. Confidence filtering is done by the service.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &[u8]) -> Result<Vec<Detection>>;
}

/// Source of frame timestamps, in seconds.
///
/// Implementations must never go backwards.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Monotonic wall clock measuring seconds since its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock driven by hand, for replaying recorded frames and for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    pub fn set(&self, now: f64) {
        self.bits.store(now.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// One frame submitted for tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRequest {
    /// Data URL of the encoded frame, e.g. `data:image/jpeg;base64,...`.
    pub image: String,
}

impl FrameRequest {
    /// Build a request from raw image bytes, encoded as a JPEG data URL.
    pub fn from_image_bytes(bytes: &[u8]) -> Self {
        Self {
            image: format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)),
        }
    }

    /// Decode the base64 payload following the first comma of the data URL.
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        let (_, payload) = self
            .image
            .split_once(',')
            .ok_or_else(|| Error::InvalidPayload("image is not a data URL".to_string()))?;

        let bytes = STANDARD.decode(payload.trim())?;
        if bytes.is_empty() {
            return Err(Error::InvalidPayload("image payload is empty".to_string()));
        }
        Ok(bytes)
    }
}

/// Outcome of one frame.
///
/// Successful responses carry the identified detections, the aggregate count
/// keyed by the configured label and the inference rate. Failed responses
/// carry only `success: false` and the error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<String, usize>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_fps: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameResponse {
    pub fn failure(error: &Error) -> Self {
        Self {
            success: false,
            detections: None,
            counts: None,
            inference_fps: None,
            error: Some(error.to_string()),
        }
    }

    /// Aggregate count reported under `label`, if any.
    pub fn count(&self, label: &str) -> Option<usize> {
        self.counts.as_ref().and_then(|counts| counts.get(label).copied())
    }
}

/// Instantaneous frame rate from the spacing of consecutive frames.
#[derive(Debug, Default)]
struct RateMeter {
    last: Option<f64>,
    fps: f64,
}

impl RateMeter {
    fn tick(&mut self, now: f64) -> f64 {
        if let Some(last) = self.last {
            let elapsed = now - last;
            if elapsed > 0.0 {
                self.fps = 1.0 / elapsed;
            }
        }
        self.last = Some(now);
        self.fps
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Tracking service shared between concurrent frame sources.
pub struct FrameService<D, C = SystemClock> {
    detector: D,
    clock: C,
    tracker: Mutex<Tracker>,
    rate: Mutex<RateMeter>,
}

impl<D: Detector> FrameService<D, SystemClock> {
    /// Create a service timed by the system clock.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self> {
        Self::with_clock(detector, SystemClock::new(), config)
    }
}

impl<D: Detector, C: Clock> FrameService<D, C> {
    /// Create a service with an explicit clock.
    pub fn with_clock(detector: D, clock: C, config: TrackerConfig) -> Result<Self> {
        Ok(Self {
            detector,
            clock,
            tracker: Mutex::new(Tracker::new(config)?),
            rate: Mutex::new(RateMeter::default()),
        })
    }

    /// Process one frame. Never fails: errors become failure responses and
    /// leave the tracker untouched.
    pub fn handle(&self, request: &FrameRequest) -> FrameResponse {
        match self.process(request) {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "frame processing failed");
                FrameResponse::failure(&err)
            }
        }
    }

    /// Process one JSON-encoded [`FrameRequest`] and return the JSON response.
    pub fn handle_json(&self, body: &str) -> String {
        let response = match serde_json::from_str::<FrameRequest>(body) {
            Ok(request) => self.handle(&request),
            Err(err) => {
                let err = Error::from(err);
                warn!(error = %err, "malformed frame request");
                FrameResponse::failure(&err)
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|err| {
            serde_json::json!({ "success": false, "error": err.to_string() }).to_string()
        })
    }

    /// Objects currently counted by the shared tracker.
    pub fn count(&self) -> Result<usize> {
        Ok(self.lock_tracker()?.count())
    }

    /// Copy of the tracker configuration in use.
    pub fn config(&self) -> Result<TrackerConfig> {
        Ok(self.lock_tracker()?.config.clone())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn process(&self, request: &FrameRequest) -> Result<FrameResponse> {
        let image = request.decode_image()?;

        let fps = {
            let mut rate = self.rate.lock().map_err(|_| Error::LockPoisoned("rate meter"))?;
            rate.tick(self.clock.now())
        };

        let detections = self.detector.detect(&image)?;
        let found = detections.len();

        let mut tracker = self.lock_tracker()?;
        let admitted: Vec<Detection> = detections
            .into_iter()
            .filter(|det| tracker.config.admits(det))
            .collect();
        debug!(found, admitted = admitted.len(), "detections admitted");

        let now = self.clock.now();
        let result = tracker.reconcile(admitted, now);

        let mut counts = BTreeMap::new();
        counts.insert(tracker.config.count_label.clone(), result.count);

        Ok(FrameResponse {
            success: true,
            detections: Some(result.detections),
            counts: Some(counts),
            inference_fps: Some(round_to(fps, 2)),
            error: None,
        })
    }

    fn lock_tracker(&self) -> Result<MutexGuard<'_, Tracker>> {
        self.tracker.lock().map_err(|_| Error::LockPoisoned("tracker"))
    }
}
