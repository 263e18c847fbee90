//! Matching utilities for centroid association.

use nalgebra::Point2;
use ndarray::Array2;

/// Compute the Euclidean distance matrix between object centroids (rows) and
/// detection centroids (columns).
pub fn centroid_distance(objects: &[Point2<f32>], detections: &[Point2<f32>]) -> Array2<f32> {
    let mut dists = Array2::zeros((objects.len(), detections.len()));
    for (i, o) in objects.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            dists[[i, j]] = nalgebra::distance(o, d);
        }
    }
    dists
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedy nearest-available assignment.
///
/// Rows are visited in ascending order of their minimum distance (ties keep row
/// order). Each row claims the column holding its minimum (first column on
/// ties) unless that row or column is already taken, in which case the row
/// stays unmatched for this call. This is not a minimum-cost assignment and
/// callers depend on exactly this tie-breaking.
pub fn greedy_assignment(cost_matrix: &Array2<f32>) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    let row_best: Vec<(usize, f32)> = cost_matrix
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = (0, row[0]);
            for (j, &d) in row.iter().enumerate().skip(1) {
                if d < best.1 {
                    best = (j, d);
                }
            }
            best
        })
        .collect();

    let mut order: Vec<usize> = (0..num_rows).collect();
    order.sort_by(|&a, &b| row_best[a].1.total_cmp(&row_best[b].1));

    let mut used_rows = vec![false; num_rows];
    let mut used_cols = vec![false; num_cols];
    let mut matches = Vec::new();

    for row in order {
        let col = row_best[row].0;
        if used_rows[row] || used_cols[col] {
            continue;
        }
        used_rows[row] = true;
        used_cols[col] = true;
        matches.push((row, col));
    }

    let unmatched_tracks = (0..num_rows).filter(|&i| !used_rows[i]).collect();
    let unmatched_detections = (0..num_cols).filter(|&j| !used_cols[j]).collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
