//! Seeded K-Means.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ClusterConfig, EPS};
use crate::encoder::{FeatureMatrix, FeatureVector};
use crate::error::{Result, SortError};

use super::metrics::{inertia, silhouette_score, squared_distance};

/// One cluster of the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster id, `0..k`.
    pub id: usize,
    /// Mean of the members, `None` for a cluster that never received a centroid.
    pub centroid: Option<FeatureVector>,
    /// Row indices assigned to this cluster.
    pub members: Vec<usize>,
}

impl Cluster {
    /// Whether no row is assigned here.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Outcome of a K-Means run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterFit {
    /// Cluster id per row.
    pub assignments: Vec<usize>,
    /// Exactly `requested_k` clusters, ids contiguous from 0.
    pub clusters: Vec<Cluster>,
    /// The `k` asked for.
    pub requested_k: usize,
    /// Clusters that received a centroid (capped by distinct rows).
    pub effective_k: usize,
    /// Seed used for initialization.
    pub seed: u64,
    /// Refinement iterations run.
    pub iterations: usize,
    /// Whether assignments stopped changing within the bound.
    pub converged: bool,
    /// Within-cluster sum of squares.
    pub inertia: f64,
    /// Mean silhouette coefficient, when defined and enabled.
    pub silhouette: Option<f64>,
}

/// K-Means with k-means++ initialization from a caller-supplied seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct KMeans {
    config: ClusterConfig,
}

impl KMeans {
    /// Create an engine with the given settings.
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Cluster the rows of `matrix` into at most `k` groups.
    ///
    /// The same matrix, `k` and `seed` always give the same fit.
    pub fn fit(&self, matrix: &FeatureMatrix, k: usize, seed: u64) -> Result<ClusterFit> {
        if k < 1 {
            return Err(SortError::invalid_parameter(
                "k",
                "cluster count must be at least 1",
            ));
        }
        if matrix.is_empty() {
            return Err(SortError::EmptyInventory);
        }

        let rows = matrix.rows();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut centroids = kmeans_plus_plus(rows, k.min(matrix.distinct_rows()), &mut rng);
        // Rows closer than EPS share a seed, so count what was actually picked.
        let effective_k = centroids.len();
        if effective_k < k {
            tracing::debug!(
                "Requested {} clusters but only {} distinct feature vectors",
                k,
                effective_k
            );
        }
        let mut assignments = assign(rows, &centroids);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;
            update_centroids(rows, &assignments, &mut centroids);
            let next = assign(rows, &centroids);
            if next == assignments {
                converged = true;
                break;
            }
            assignments = next;
        }
        if !converged {
            tracing::debug!(
                "K-Means stopped after {} iterations without converging",
                iterations
            );
        }

        let sizes = cluster_sizes(&assignments, effective_k);
        let sums = accumulate(rows, &assignments, effective_k);
        for (c, sum) in sums.into_iter().enumerate() {
            if sizes[c] > 0 {
                centroids[c] = mean(sum, sizes[c]);
            }
        }

        let inertia = inertia(rows, &assignments, &centroids);
        let silhouette = if self.config.silhouette {
            silhouette_score(rows, &assignments, effective_k)
        } else {
            None
        };

        let mut clusters: Vec<Cluster> = (0..k)
            .map(|id| Cluster {
                id,
                centroid: centroids.get(id).cloned(),
                members: Vec::new(),
            })
            .collect();
        for (row, &c) in assignments.iter().enumerate() {
            clusters[c].members.push(row);
        }

        tracing::debug!(
            "K-Means: k={} effective={} iterations={} inertia={:.6}",
            k,
            effective_k,
            iterations,
            inertia
        );

        Ok(ClusterFit {
            assignments,
            clusters,
            requested_k: k,
            effective_k,
            seed,
            iterations,
            converged,
            inertia,
            silhouette,
        })
    }
}

/// Cluster with default settings and return only the assignment vector.
pub fn cluster(matrix: &FeatureMatrix, k: usize, seed: u64) -> Result<Vec<usize>> {
    KMeans::default().fit(matrix, k, seed).map(|fit| fit.assignments)
}

/// Index and squared distance of the nearest centroid; ties go to the
/// lowest id.
fn nearest(row: &[f64], centroids: &[FeatureVector]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// Nearest-centroid assignment, parallel over rows. `collect` waits for every
/// row before returning.
fn assign(rows: &[FeatureVector], centroids: &[FeatureVector]) -> Vec<usize> {
    rows.par_iter().map(|row| nearest(row, centroids).0).collect()
}

/// k-means++ seeding. Picks `k` pairwise distinct rows; the caller guarantees
/// at least `k` distinct rows exist.
fn kmeans_plus_plus(
    rows: &[FeatureVector],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<FeatureVector> {
    let mut centroids: Vec<FeatureVector> = Vec::with_capacity(k);
    if k == 0 {
        return centroids;
    }

    let first = rng.gen_range(0..rows.len());
    centroids.push(rows[first].clone());
    let mut min_distances: Vec<f64> = rows
        .iter()
        .map(|row| squared_distance(row, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_distances.iter().sum();
        let selected = if total > EPS {
            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut selected = None;
            for (i, &d) in min_distances.iter().enumerate() {
                if d <= EPS {
                    continue;
                }
                cumulative += d;
                selected = Some(i);
                if cumulative >= threshold {
                    break;
                }
            }
            selected
        } else {
            None
        };

        let Some(idx) = selected.or_else(|| min_distances.iter().position(|&d| d > EPS)) else {
            break;
        };
        centroids.push(rows[idx].clone());
        let newest = &centroids[centroids.len() - 1];
        for (d, row) in min_distances.iter_mut().zip(rows) {
            *d = d.min(squared_distance(row, newest));
        }
    }

    centroids
}

fn cluster_sizes(assignments: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; k];
    for &c in assignments {
        sizes[c] += 1;
    }
    sizes
}

fn accumulate(rows: &[FeatureVector], assignments: &[usize], k: usize) -> Vec<FeatureVector> {
    let dims = rows.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0; dims]; k];
    for (row, &c) in rows.iter().zip(assignments) {
        for (s, v) in sums[c].iter_mut().zip(row) {
            *s += v;
        }
    }
    sums
}

fn mean(mut sum: FeatureVector, count: usize) -> FeatureVector {
    for v in sum.iter_mut() {
        *v /= count as f64;
    }
    sum
}

/// Move every centroid to the mean of its members. An emptied cluster takes
/// the row farthest from its own centroid that is not already a centroid.
fn update_centroids(
    rows: &[FeatureVector],
    assignments: &[usize],
    centroids: &mut [FeatureVector],
) {
    let k = centroids.len();
    let mut sizes = cluster_sizes(assignments, k);
    let sums = accumulate(rows, assignments, k);
    let previous: Vec<FeatureVector> = centroids.to_vec();

    for (c, sum) in sums.into_iter().enumerate() {
        if sizes[c] > 0 {
            centroids[c] = mean(sum, sizes[c]);
        }
    }

    for c in 0..k {
        if sizes[c] > 0 {
            continue;
        }
        let mut candidates: Vec<(usize, f64)> = rows
            .iter()
            .zip(assignments)
            .enumerate()
            .filter(|(_, (_, owner))| sizes[**owner] > 1)
            .map(|(i, (row, &owner))| (i, squared_distance(row, &previous[owner])))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let chosen = candidates.into_iter().map(|(i, _)| i).find(|&i| {
            centroids
                .iter()
                .all(|centroid| squared_distance(&rows[i], centroid) > EPS)
        });
        if let Some(i) = chosen {
            tracing::debug!("Reseeding empty cluster {} with row {}", c, i);
            sizes[assignments[i]] -= 1;
            sizes[c] = 1;
            centroids[c] = rows[i].clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f64]]) -> FeatureMatrix {
        FeatureMatrix::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    fn two_blobs() -> FeatureMatrix {
        matrix(&[
            &[0.0, 0.0],
            &[0.1, 0.0],
            &[0.0, 0.1],
            &[5.0, 5.0],
            &[5.1, 5.0],
            &[5.0, 5.1],
        ])
    }

    #[test]
    fn test_separates_blobs() {
        let fit = KMeans::default().fit(&two_blobs(), 2, 7).unwrap();
        assert!(fit.converged);
        let a = fit.assignments[0];
        assert!(fit.assignments[..3].iter().all(|&c| c == a));
        assert!(fit.assignments[3..].iter().all(|&c| c != a));
        assert!(fit.silhouette.unwrap() > 0.9);
    }

    #[test]
    fn test_same_seed_same_fit() {
        for seed in [0, 1, 42, u64::from(u32::MAX)] {
            let first = KMeans::default().fit(&two_blobs(), 3, seed).unwrap();
            let second = KMeans::default().fit(&two_blobs(), 3, seed).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_partition() {
        let fit = KMeans::default().fit(&two_blobs(), 4, 3).unwrap();
        let mut seen: Vec<usize> = fit.clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..6).collect::<Vec<_>>());
        assert_eq!(
            fit.clusters.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_k_capped_by_distinct_rows() {
        let m = matrix(&[&[0.0], &[0.0], &[1.0]]);
        let fit = KMeans::default().fit(&m, 5, 0).unwrap();
        assert_eq!(fit.requested_k, 5);
        assert_eq!(fit.effective_k, 2);
        assert_eq!(fit.clusters.len(), 5);
        assert_eq!(fit.clusters.iter().filter(|c| !c.is_empty()).count(), 2);
        assert!(fit.clusters[2..].iter().all(|c| c.is_empty() && c.centroid.is_none()));
    }

    #[test]
    fn test_near_identical_rows_share_a_cluster() {
        let m = matrix(&[&[0.0], &[1e-7]]);
        assert_eq!(m.distinct_rows(), 2);
        let fit = KMeans::default().fit(&m, 2, 0).unwrap();
        assert_eq!(fit.effective_k, 1);
        assert_eq!(
            fit.clusters.iter().filter(|c| !c.is_empty()).count(),
            fit.effective_k
        );
        assert!(fit.clusters[1].centroid.is_none());
    }

    #[test]
    fn test_reseed_takes_farthest_row() {
        let rows = vec![vec![0.0], vec![1.0], vec![10.0], vec![0.0]];
        let assignments = vec![0, 0, 0, 0];
        let mut centroids = vec![vec![0.0], vec![50.0]];
        update_centroids(&rows, &assignments, &mut centroids);
        assert_eq!(centroids, vec![vec![11.0 / 4.0], vec![10.0]]);
    }

    #[test]
    fn test_reseed_ties_go_to_lowest_row() {
        let rows = vec![vec![-2.0], vec![2.0], vec![0.0]];
        let assignments = vec![0, 0, 0];
        let mut centroids = vec![vec![0.0], vec![9.0]];
        update_centroids(&rows, &assignments, &mut centroids);
        assert_eq!(centroids[1], vec![-2.0]);
    }

    #[test]
    fn test_reseed_skips_rows_on_a_centroid() {
        // Rows 2 and 3 are farthest but land on centroid 1's new mean.
        let rows = vec![vec![0.0], vec![1.0], vec![4.0], vec![4.0]];
        let assignments = vec![0, 0, 1, 1];
        let mut centroids = vec![vec![0.0], vec![0.0], vec![100.0]];
        update_centroids(&rows, &assignments, &mut centroids);
        assert_eq!(centroids[1], vec![4.0]);
        assert_eq!(centroids[2], vec![1.0]);
    }

    #[test]
    fn test_invalid_k() {
        let err = KMeans::default().fit(&two_blobs(), 0, 0).unwrap_err();
        assert!(matches!(err, SortError::InvalidParameter { .. }));
    }

    #[test]
    fn test_empty_matrix() {
        let err = KMeans::default()
            .fit(&FeatureMatrix::default(), 3, 0)
            .unwrap_err();
        assert!(matches!(err, SortError::EmptyInventory));
    }

    #[test]
    fn test_single_cluster_is_mean() {
        let fit = KMeans::default().fit(&matrix(&[&[0.0], &[2.0]]), 1, 9).unwrap();
        assert_eq!(fit.assignments, vec![0, 0]);
        assert_eq!(fit.clusters[0].centroid, Some(vec![1.0]));
        assert!((fit.inertia - 2.0).abs() < 1e-12);
        assert_eq!(fit.silhouette, None);
    }

    #[test]
    fn test_iteration_bound_is_not_an_error() {
        let fit = KMeans::new(ClusterConfig::new(0)).fit(&two_blobs(), 2, 5).unwrap();
        assert_eq!(fit.iterations, 0);
        assert!(!fit.converged);
        assert_eq!(fit.assignments.len(), 6);
    }

    #[test]
    fn test_nearest_ties_go_to_lowest_id() {
        let centroids = vec![vec![1.0], vec![-1.0]];
        assert_eq!(nearest(&[0.0], &centroids).0, 0);
    }

    #[test]
    fn test_kmeans_plus_plus_distinct() {
        let m = matrix(&[&[0.0], &[0.0], &[0.0], &[1.0], &[2.0]]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let centroids = kmeans_plus_plus(m.rows(), 3, &mut rng);
        assert_eq!(centroids.len(), 3);
        for i in 0..3 {
            for j in i + 1..3 {
                assert!(squared_distance(&centroids[i], &centroids[j]) > EPS);
            }
        }
    }

    #[test]
    fn test_cluster_convenience() {
        let assignments = cluster(&two_blobs(), 2, 1).unwrap();
        assert_eq!(assignments.len(), 6);
    }
}
