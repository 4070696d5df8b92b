//! Turns a cluster fit into the result handed back to callers.

mod summary;

pub use summary::{common_path, dominant_category, ClusterSummary};

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::catalog::HierarchyNode;
use crate::cluster::ClusterFit;
use crate::diagnostics::Diagnostics;
use crate::error::Warning;
use crate::model::{Inventory, PartRecord};

/// Where one record ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Cluster id.
    pub cluster: usize,
    /// Hierarchy path the record was encoded with.
    pub path: Vec<String>,
    /// False when the record fell back to the unknown leaf.
    pub resolved: bool,
}

/// Fit statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitStats {
    pub iterations: usize,
    pub converged: bool,
    /// Within-cluster sum of squares.
    pub inertia: f64,
    pub silhouette: Option<f64>,
}

/// Complete answer for one clustering request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    pub inventory: Inventory,
    pub requested_k: usize,
    pub effective_k: usize,
    pub seed: u64,
    /// Ordered by descending quantity, ties by id, empty clusters last.
    pub clusters: Vec<ClusterSummary>,
    /// One entry per inventory record.
    pub placements: Vec<Placement>,
    pub warnings: Vec<Warning>,
    pub stats: FitStats,
}

impl ClusteringResult {
    /// Summary for cluster `id`.
    pub fn cluster(&self, id: usize) -> Option<&ClusterSummary> {
        self.clusters.iter().find(|c| c.id == id)
    }

    /// Placement of record `index`.
    pub fn placement(&self, index: usize) -> Option<&Placement> {
        self.placements.get(index)
    }

    /// Records belonging to a summary.
    pub fn members<'a>(
        &'a self,
        summary: &'a ClusterSummary,
    ) -> impl Iterator<Item = &'a PartRecord> + 'a {
        summary.members.iter().filter_map(|&i| self.inventory.get(i))
    }

    /// Clusters with at least one member.
    pub fn non_empty_clusters(&self) -> impl Iterator<Item = &ClusterSummary> {
        self.clusters.iter().filter(|c| !c.is_empty())
    }
}

/// Build the result from the inventory, per-record nodes and the fit.
pub fn assemble(
    inventory: Inventory,
    nodes: &[&HierarchyNode],
    fit: ClusterFit,
    diagnostics: Diagnostics,
) -> ClusteringResult {
    let mut clusters: Vec<ClusterSummary> = fit
        .clusters
        .iter()
        .map(|cluster| ClusterSummary::build(cluster, &inventory, nodes))
        .collect();
    clusters.sort_by_key(|c| (c.is_empty(), Reverse(c.quantity), c.id));

    let placements = fit
        .assignments
        .iter()
        .zip(nodes)
        .map(|(&cluster, node)| Placement {
            cluster,
            path: node.path.clone(),
            resolved: !node.is_unknown(),
        })
        .collect();

    for summary in clusters.iter().filter(|c| !c.is_empty()) {
        tracing::debug!(
            "Cluster {}: {} ({} parts, {} pieces)",
            summary.id,
            summary.label,
            summary.part_count,
            summary.quantity
        );
    }

    ClusteringResult {
        inventory,
        requested_k: fit.requested_k,
        effective_k: fit.effective_k,
        seed: fit.seed,
        clusters,
        placements,
        warnings: diagnostics.into_warnings(),
        stats: FitStats {
            iterations: fit.iterations,
            converged: fit.converged,
            inertia: fit.inertia,
            silhouette: fit.silhouette,
        },
    }
}
