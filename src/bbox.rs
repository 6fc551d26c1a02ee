//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Axis-aligned bounding box in `[x1, y1, x2, y2]` corner format.
///
/// `x1 < x2` and `y1 < y2` are expected but not enforced. Degenerate or
/// inverted boxes report a zero or negative area and never overlap anything.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from a slice of exactly four coordinates.
    pub fn from_slice(coords: &[f64]) -> Result<Self> {
        match coords {
            &[x1, y1, x2, y2] => Ok(Self::new(x1, y1, x2, y2)),
            _ => Err(Error::InvalidPayload(format!(
                "bounding box needs 4 coordinates, got {}",
                coords.len()
            ))),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Signed area; negative for inverted boxes.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        bbox.to_array()
    }
}
