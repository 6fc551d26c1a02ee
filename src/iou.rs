//! IoU (Intersection over Union) overlap metric.

use nalgebra::DMatrix;

use crate::BoundingBox;

/// Compute the IoU of two boxes.
///
/// Returns `0.0` whenever the union is not positive, so degenerate and
/// inverted boxes never produce NaN. The result lies in `[0, 1]` for
/// well-formed boxes and is symmetric in its arguments.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    // Intersection
    let inter_x1 = a.x1.max(b.x1);
    let inter_y1 = a.y1.max(b.y1);
    let inter_x2 = a.x2.min(b.x2);
    let inter_y2 = a.y2.min(b.y2);

    let inter_w = (inter_x2 - inter_x1).max(0.0);
    let inter_h = (inter_y2 - inter_y1).max(0.0);
    let inter_area = inter_w * inter_h;

    // Union
    let union_area = a.area() + b.area() - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}

/// Compute the IoU matrix between candidate boxes and track boxes.
///
/// # Arguments
/// * `candidates` - Candidate boxes (rows)
/// * `tracks` - Track boxes (columns)
///
/// # Returns
/// IoU matrix of shape (n_candidates, n_tracks)
pub fn iou_matrix(candidates: &[BoundingBox], tracks: &[BoundingBox]) -> DMatrix<f64> {
    let n = candidates.len();
    let m = tracks.len();

    if n == 0 || m == 0 {
        return DMatrix::zeros(n, m);
    }

    DMatrix::from_fn(n, m, |i, j| iou(&candidates[i], &tracks[j]))
}
