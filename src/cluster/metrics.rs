//! Distance and clustering quality metrics.

use rayon::prelude::*;

/// Squared Euclidean distance.
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean distance.
#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Within-cluster sum of squared distances to the assigned centroid.
pub fn inertia(rows: &[Vec<f64>], assignments: &[usize], centroids: &[Vec<f64>]) -> f64 {
    rows.iter()
        .zip(assignments)
        .map(|(row, &c)| squared_distance(row, &centroids[c]))
        .sum()
}

/// Mean silhouette coefficient over all points.
///
/// Returns `None` unless at least two clusters are populated and at least one
/// cluster holds fewer than all points.
pub fn silhouette_score(rows: &[Vec<f64>], assignments: &[usize], k: usize) -> Option<f64> {
    let n = rows.len();
    let mut sizes = vec![0usize; k];
    for &c in assignments {
        sizes[c] += 1;
    }
    let populated = sizes.iter().filter(|&&s| s > 0).count();
    if populated < 2 || populated >= n {
        return None;
    }

    let per_point: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| {
            let own = assignments[i];
            if sizes[own] < 2 {
                return 0.0;
            }
            let mut sums = vec![0.0; k];
            for (j, row) in rows.iter().enumerate() {
                if i != j {
                    sums[assignments[j]] += euclidean_distance(&rows[i], row);
                }
            }
            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own && sizes[c] > 0)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();

    Some(per_point.iter().sum::<f64>() / n as f64)
}
