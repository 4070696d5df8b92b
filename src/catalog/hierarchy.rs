//! Category hierarchy catalog.
//!
//! Maps catalog ids to a fixed taxonomy path such as
//! `Wheels > Tires`. Built once, then shared read-only.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ROOT_LABELS, UNKNOWN_LABEL};
use crate::error::{Result, SortError};
use crate::model::design_id;

/// One taxonomy leaf and the parts filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Category labels from root to leaf.
    pub path: Vec<String>,
    /// Parts mapped to this node.
    #[serde(alias = "parts")]
    pub catalog_ids: BTreeSet<String>,
}

impl HierarchyNode {
    /// Create a node from a path and its parts.
    pub fn new<P, I>(path: P, catalog_ids: I) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            catalog_ids: catalog_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Sentinel leaf for parts missing from the catalog.
    pub fn unknown() -> Self {
        Self {
            path: vec![UNKNOWN_LABEL.to_string()],
            catalog_ids: BTreeSet::new(),
        }
    }

    /// Top-level category.
    pub fn top_level(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or(UNKNOWN_LABEL)
    }

    /// Leaf category.
    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or(UNKNOWN_LABEL)
    }

    /// Number of levels in the path.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Whether this is the unknown sentinel.
    pub fn is_unknown(&self) -> bool {
        self.path.len() == 1 && self.path[0] == UNKNOWN_LABEL
    }

    /// Path joined for display, without chapter numbers.
    pub fn display_path(&self) -> String {
        self.path
            .iter()
            .map(|l| display_label(l))
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// Result of looking up a catalog id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The id is listed as-is.
    Exact(&'a HierarchyNode),
    /// Only the leading design number is listed (`3626cpr0001` -> `3626`).
    BaseMould(&'a HierarchyNode),
    /// Not in the catalog.
    Unresolved,
}

impl<'a> Resolution<'a> {
    /// Node found, if any.
    pub fn node(self) -> Option<&'a HierarchyNode> {
        match self {
            Resolution::Exact(node) | Resolution::BaseMould(node) => Some(node),
            Resolution::Unresolved => None,
        }
    }

    /// Whether a node was found.
    pub fn is_resolved(self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// On-disk catalog document.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    nodes: Vec<HierarchyNode>,
}

/// Immutable catalog id -> hierarchy node mapping.
#[derive(Debug, Clone)]
pub struct HierarchyCatalog {
    nodes: Vec<HierarchyNode>,
    by_id: HashMap<String, usize>,
    unknown: HierarchyNode,
}

impl HierarchyCatalog {
    /// Build a catalog from nodes.
    ///
    /// Labels are trimmed and a leading `Lego` root label is dropped. Fails
    /// on empty or duplicate paths, on a path reserved for unknown parts, and
    /// on a catalog id filed under two nodes.
    pub fn from_nodes(nodes: impl IntoIterator<Item = HierarchyNode>) -> Result<Self> {
        let mut built = Vec::new();
        let mut by_id = HashMap::new();
        let mut paths = HashSet::new();

        for mut node in nodes {
            node.path = normalize_path(&node.path);
            if node.path.is_empty() {
                return Err(catalog_error(format!(
                    "node for parts [{}] has an empty path",
                    join_ids(&node.catalog_ids)
                )));
            }
            if node.is_unknown() {
                return Err(catalog_error(format!(
                    "path '{}' is reserved for unresolved parts",
                    UNKNOWN_LABEL
                )));
            }
            if !paths.insert(node.path.clone()) {
                return Err(catalog_error(format!(
                    "duplicate path '{}'",
                    node.path.join(" > ")
                )));
            }

            let idx = built.len();
            for id in &node.catalog_ids {
                if let Some(&other) = by_id.get(id) {
                    let other: &HierarchyNode = &built[other];
                    return Err(catalog_error(format!(
                        "part {} is filed under both '{}' and '{}'",
                        id,
                        other.path.join(" > "),
                        node.path.join(" > ")
                    )));
                }
                by_id.insert(id.clone(), idx);
            }
            built.push(node);
        }

        tracing::debug!(
            "Built hierarchy catalog: {} node(s), {} part(s)",
            built.len(),
            by_id.len()
        );
        Ok(Self {
            nodes: built,
            by_id,
            unknown: HierarchyNode::unknown(),
        })
    }

    /// Load a catalog from a JSON document:
    /// `{"nodes": [{"path": ["Wheels", "Tires"], "parts": ["3641"]}]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|e| {
            catalog_error(format!("line {}, column {}: {}", e.line(), e.column(), e))
        })?;
        Self::from_nodes(file.nodes)
    }

    /// Load a catalog file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SortError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(SortError::EmptyFile {
                path: path.to_path_buf(),
            });
        }
        Self::from_json_str(&content)
    }

    /// Look up a catalog id, falling back to its design number.
    pub fn resolve(&self, catalog_id: &str) -> Resolution<'_> {
        let catalog_id = catalog_id.trim();
        if let Some(&idx) = self.by_id.get(catalog_id) {
            return Resolution::Exact(&self.nodes[idx]);
        }
        design_id(catalog_id)
            .filter(|base| *base != catalog_id)
            .and_then(|base| self.by_id.get(base))
            .map(|&idx| Resolution::BaseMould(&self.nodes[idx]))
            .unwrap_or(Resolution::Unresolved)
    }

    /// Node for a catalog id, or the unknown sentinel. The flag tells whether
    /// the id resolved.
    pub fn resolve_or_unknown(&self, catalog_id: &str) -> (&HierarchyNode, bool) {
        let resolution = self.resolve(catalog_id);
        match resolution.node() {
            Some(node) => (node, resolution.is_resolved()),
            None => (&self.unknown, false),
        }
    }

    /// Sentinel node for unresolved parts.
    pub fn unknown(&self) -> &HierarchyNode {
        &self.unknown
    }

    /// All nodes, in load order.
    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the catalog has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Strip a brickarchitect chapter number (`"3. Plate"` -> `"Plate"`).
pub fn display_label(label: &str) -> &str {
    let digits = label.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = label[digits..].strip_prefix(". ") {
            return rest.trim_start();
        }
    }
    label
}

fn normalize_path(path: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = path
        .iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if labels
        .first()
        .is_some_and(|first| ROOT_LABELS.contains(&first.as_str()))
    {
        labels.remove(0);
    }
    labels
}

fn join_ids(ids: &BTreeSet<String>) -> String {
    ids.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn catalog_error(message: String) -> SortError {
    SortError::Catalog { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> HierarchyCatalog {
        HierarchyCatalog::from_nodes([
            HierarchyNode::new(["Lego", "Wheels", "Tires"], ["3641", "6014"]),
            HierarchyNode::new(["Lego", "Wheels", "Rims"], ["4624"]),
            HierarchyNode::new(["Windows", "Frames"], ["60592"]),
            HierarchyNode::new(["Minifig", "Heads"], ["3626"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_exact() {
        let catalog = catalog();
        let node = catalog.resolve("3641").node().unwrap();
        assert_eq!(node.path, vec!["Wheels".to_string(), "Tires".to_string()]);
        assert_eq!(node.top_level(), "Wheels");
        assert_eq!(node.leaf(), "Tires");
        assert!(matches!(catalog.resolve("4624"), Resolution::Exact(_)));
    }

    #[test]
    fn test_resolve_base_mould() {
        let catalog = catalog();
        match catalog.resolve("3626cpr0001") {
            Resolution::BaseMould(node) => assert_eq!(node.top_level(), "Minifig"),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_falls_back_to_unknown() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("99999"), Resolution::Unresolved);
        assert!(!catalog.resolve("99999").is_resolved());
        assert!(catalog.resolve("3626cpr0001").is_resolved());
        let (node, resolved) = catalog.resolve_or_unknown("99999");
        assert!(!resolved);
        assert!(node.is_unknown());
    }

    #[test]
    fn test_duplicate_part_rejected() {
        let err = HierarchyCatalog::from_nodes([
            HierarchyNode::new(["Wheels"], ["3641"]),
            HierarchyNode::new(["Tires"], ["3641"]),
        ])
        .unwrap_err();
        assert!(matches!(err, SortError::Catalog { .. }));
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let err = HierarchyCatalog::from_nodes([
            HierarchyNode::new(["Wheels", "Tires"], ["3641"]),
            HierarchyNode::new(["Lego", "Wheels", "Tires"], ["6014"]),
        ])
        .unwrap_err();
        assert!(matches!(err, SortError::Catalog { .. }));
    }

    #[test]
    fn test_empty_and_reserved_paths_rejected() {
        assert!(HierarchyCatalog::from_nodes([HierarchyNode::new(["Lego"], ["1"])]).is_err());
        assert!(HierarchyCatalog::from_nodes([HierarchyNode::new(["Unknown"], ["1"])]).is_err());
    }

    #[test]
    fn test_from_json_str() {
        let catalog = HierarchyCatalog::from_json_str(
            r#"{"nodes": [
                {"path": ["1. Basic", "Brick"], "parts": ["3001", "3004"]},
                {"path": ["3. Plate"], "catalog_ids": ["3023"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve("3004").node().unwrap().leaf(), "Brick");
        assert_eq!(
            catalog.resolve("3001").node().unwrap().display_path(),
            "Basic > Brick"
        );
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(matches!(
            HierarchyCatalog::from_json_str("{\"nodes\": ["),
            Err(SortError::Catalog { .. })
        ));
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("3. Plate"), "Plate");
        assert_eq!(display_label("12. Technic"), "Technic");
        assert_eq!(display_label("2x2 Plate"), "2x2 Plate");
        assert_eq!(display_label("Wheels"), "Wheels");
    }

    #[test]
    fn test_catalog_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HierarchyCatalog>();
    }
}
