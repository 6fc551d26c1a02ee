//! Detection struct for input to the tracker.

use serde::{Deserialize, Serialize};

use crate::track::TrackId;
use crate::{BoundingBox, Error, Result};

/// A single detector observation for one frame.
///
/// Detections are produced fresh for every frame. The tracker consumes them
/// and hands them back with `id` filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box in `[x1, y1, x2, y2]` format.
    pub bbox: BoundingBox,

    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,

    /// Class name reported by the detector.
    #[serde(rename = "class")]
    pub label: String,

    /// Identity assigned by the tracker (set during reconciliation).
    #[serde(rename = "rose_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TrackId>,
}

impl Detection {
    /// Create a new, not yet identified detection.
    pub fn new(bbox: BoundingBox, confidence: f64, label: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            label: label.into(),
            id: None,
        }
    }

    /// Create a detection from a flat `[x1, y1, x2, y2]` slice.
    ///
    /// Rejects slices of the wrong length and confidences that are not
    /// finite numbers.
    pub fn from_slice(coords: &[f64], confidence: f64, label: impl Into<String>) -> Result<Self> {
        if !confidence.is_finite() {
            return Err(Error::InvalidDetection(format!(
                "confidence must be finite, got {}",
                confidence
            )));
        }
        let bbox = BoundingBox::from_slice(coords)?;
        Ok(Self::new(bbox, confidence, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_new() {
        let det = Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9, "rose");

        assert_eq!(det.label, "rose");
        assert_eq!(det.id, None);
    }

    #[test]
    fn test_detection_from_slice() {
        let det = Detection::from_slice(&[1.0, 2.0, 3.0, 4.0], 0.5, "rose").unwrap();
        assert_eq!(det.bbox, BoundingBox::new(1.0, 2.0, 3.0, 4.0));

        assert!(Detection::from_slice(&[1.0, 2.0], 0.5, "rose").is_err());
        assert!(Detection::from_slice(&[1.0, 2.0, 3.0, 4.0], f64::NAN, "rose").is_err());
    }

    #[test]
    fn test_detection_wire_format() {
        let mut det = Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.75, "rose");
        let json = serde_json::to_value(&det).unwrap();
        assert_eq!(json["class"], "rose");
        assert!(json.get("rose_id").is_none());

        det.id = Some(3);
        let json = serde_json::to_value(&det).unwrap();
        assert_eq!(json["rose_id"], 3);
        assert_eq!(json["bbox"], serde_json::json!([0.0, 0.0, 10.0, 10.0]));
    }

    #[test]
    fn test_detection_parse_without_id() {
        let det: Detection = serde_json::from_str(
            r#"{"bbox": [1, 1, 11, 11], "confidence": 0.8, "class": "rose"}"#,
        )
        .unwrap();
        assert_eq!(det.id, None);
        assert_eq!(det.bbox, BoundingBox::new(1.0, 1.0, 11.0, 11.0));
    }
}
