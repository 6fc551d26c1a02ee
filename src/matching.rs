//! Greedy detection-to-track matching helpers.

use std::cmp::Ordering;

use nalgebra::DMatrix;

use crate::Detection;

/// Order detection indices by confidence, highest first.
///
/// The sort is stable: detections with equal confidence keep their input
/// order. NaN confidences compare as equal to everything and therefore also
/// keep their relative position.
pub fn confidence_order(detections: &[Detection]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .partial_cmp(&detections[a].confidence)
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Pick the best unclaimed track for one candidate.
///
/// Scans row `row` of `iou_matrix` (candidates x tracks) left to right and
/// returns the column with the strictly greatest IoU that also exceeds
/// `threshold`. Columns whose `claimed` flag is set are skipped. Because the
/// comparison is strict, the leftmost column wins a tie.
///
/// # Arguments
/// * `iou_matrix` - IoU matrix of shape (n_candidates, n_tracks)
/// * `row` - Candidate row to scan
/// * `claimed` - One flag per track column
/// * `threshold` - Minimum IoU (exclusive) for a valid match
pub fn best_match(
    iou_matrix: &DMatrix<f64>,
    row: usize,
    claimed: &[bool],
    threshold: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;

    for col in 0..iou_matrix.ncols() {
        if claimed[col] {
            continue;
        }
        let overlap = iou_matrix[(row, col)];
        if overlap <= threshold {
            continue;
        }
        match best {
            Some((_, best_overlap)) if overlap <= best_overlap => {}
            _ => best = Some((col, overlap)),
        }
    }

    best
}

/// Get unmatched indices from a match result.
pub fn get_unmatched(total: usize, matched: &[usize]) -> Vec<usize> {
    let mut is_matched = vec![false; total];
    for &idx in matched {
        is_matched[idx] = true;
    }
    (0..total).filter(|&i| !is_matched[i]).collect()
}
