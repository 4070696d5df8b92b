//! Per-cluster summaries and labels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{display_label, HierarchyNode};
use crate::cluster::Cluster;
use crate::config::OTHER_LABEL;
use crate::encoder::FeatureVector;
use crate::model::Inventory;

/// Human-facing description of one storage bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: usize,
    /// Deepest label shared by every member (`Tires` for a bin of tires and
    /// nothing else), else the dominant top-level category, else `Other`.
    /// Chapter numbers are stripped. The top-level category stays available
    /// in `dominant_category` even when a deeper label wins.
    pub label: String,
    /// Most frequent top-level category among members.
    pub dominant_category: Option<String>,
    /// Path prefix shared by every member.
    pub common_path: Vec<String>,
    /// Distinct records in the bin.
    pub part_count: usize,
    /// Sum of member quantities.
    pub quantity: u64,
    /// Record indices, ascending.
    pub members: Vec<usize>,
    pub centroid: Option<FeatureVector>,
}

impl ClusterSummary {
    /// Summarize `cluster` given the node each record was placed at.
    pub fn build(cluster: &Cluster, inventory: &Inventory, nodes: &[&HierarchyNode]) -> Self {
        let quantity = cluster
            .members
            .iter()
            .filter_map(|&i| inventory.get(i))
            .map(|r| u64::from(r.quantity))
            .sum();
        let member_nodes: Vec<&HierarchyNode> =
            cluster.members.iter().filter_map(|&i| nodes.get(i).copied()).collect();

        let dominant_category = dominant_category(&member_nodes);
        let common_path = common_path(&member_nodes);
        let label = cluster_label(&common_path, dominant_category.as_deref());

        Self {
            id: cluster.id,
            label,
            dominant_category,
            common_path,
            part_count: cluster.members.len(),
            quantity,
            members: cluster.members.clone(),
            centroid: cluster.centroid.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Most frequent top-level category, one vote per record. Ties go to the
/// alphabetically first label.
pub fn dominant_category(nodes: &[&HierarchyNode]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in nodes {
        *counts.entry(node.top_level()).or_insert(0) += 1;
    }
    // BTreeMap iterates alphabetically; keep the first maximum.
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

/// Longest path prefix shared by all nodes.
pub fn common_path(nodes: &[&HierarchyNode]) -> Vec<String> {
    let Some((first, rest)) = nodes.split_first() else {
        return Vec::new();
    };
    let mut len = first.path.len();
    for node in rest {
        len = len.min(
            first
                .path
                .iter()
                .zip(&node.path)
                .take_while(|(a, b)| a == b)
                .count(),
        );
        if len == 0 {
            break;
        }
    }
    first.path[..len].to_vec()
}

fn cluster_label(common_path: &[String], dominant: Option<&str>) -> String {
    common_path
        .last()
        .map(String::as_str)
        .or(dominant)
        .map(|l| display_label(l).to_string())
        .unwrap_or_else(|| OTHER_LABEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &[&str]) -> HierarchyNode {
        HierarchyNode::new(path.iter().copied(), Vec::<String>::new())
    }

    #[test]
    fn test_common_path() {
        let tire = node(&["Wheels", "Tires"]);
        let rim = node(&["Wheels", "Rims"]);
        let window = node(&["Windows", "1x2"]);

        assert_eq!(common_path(&[&tire, &tire]), vec!["Wheels", "Tires"]);
        assert_eq!(common_path(&[&tire, &rim]), vec!["Wheels"]);
        assert!(common_path(&[&tire, &window]).is_empty());
        assert!(common_path(&[]).is_empty());
    }

    #[test]
    fn test_dominant_ties_alphabetical() {
        let tire = node(&["Wheels", "Tires"]);
        let window = node(&["Windows", "1x2"]);
        let brick = node(&["Bricks"]);

        assert_eq!(
            dominant_category(&[&window, &tire]),
            Some("Wheels".to_string())
        );
        assert_eq!(
            dominant_category(&[&window, &window, &brick]),
            Some("Windows".to_string())
        );
        assert_eq!(dominant_category(&[]), None);
    }

    #[test]
    fn test_label_rules() {
        let path = vec!["3. Plate".to_string(), "12. Round".to_string()];
        assert_eq!(cluster_label(&path, Some("3. Plate")), "Round");
        assert_eq!(cluster_label(&[], Some("7. Technic")), "Technic");
        assert_eq!(cluster_label(&[], None), OTHER_LABEL);
    }
}
