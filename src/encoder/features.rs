//! Hierarchy, color and size features.

use std::collections::HashMap;

use crate::catalog::{HierarchyCatalog, HierarchyNode};
use crate::config::{EncoderConfig, SIZE_SATURATION_STUDS};
use crate::error::{Result, Warning};
use crate::model::{Inventory, PartRecord};

use super::color;
use super::matrix::{FeatureMatrix, FeatureVector};

const COLOR_DIMS: usize = 3;
const SIZE_DIMS: usize = 1;

/// Encoder output for one inventory.
#[derive(Debug, Clone)]
pub struct EncodedInventory<'a> {
    /// One row per record.
    pub matrix: FeatureMatrix,
    /// Hierarchy node each record was encoded with.
    pub nodes: Vec<&'a HierarchyNode>,
    /// One warning per record that fell back to the unknown leaf.
    pub warnings: Vec<Warning>,
}

impl EncodedInventory<'_> {
    /// Number of records placed under the unknown leaf.
    pub fn unresolved_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_unknown()).count()
    }
}

/// Turns part records into fixed-length feature vectors.
///
/// Every path prefix in the catalog owns one dimension. A prefix at depth `d`
/// contributes `depth_decay^d`, so parts sharing a top-level category stay
/// close and deeper labels only separate siblings. Color and stud size follow
/// with weights small enough to matter only inside a leaf.
#[derive(Debug, Clone)]
pub struct FeatureEncoder<'a> {
    catalog: &'a HierarchyCatalog,
    config: EncoderConfig,
    prefixes: HashMap<Vec<String>, usize>,
}

impl<'a> FeatureEncoder<'a> {
    /// Create an encoder over the catalog's taxonomy.
    pub fn new(catalog: &'a HierarchyCatalog, config: EncoderConfig) -> Self {
        let mut prefixes = HashMap::new();
        let nodes = catalog.nodes().iter().chain(std::iter::once(catalog.unknown()));
        for node in nodes {
            for depth in 1..=node.depth() {
                let prefix = node.path[..depth].to_vec();
                let next = prefixes.len();
                prefixes.entry(prefix).or_insert(next);
            }
        }
        tracing::debug!("Feature encoder: {} path dimension(s)", prefixes.len());
        Self {
            catalog,
            config,
            prefixes,
        }
    }

    /// Length of every vector produced.
    pub fn dims(&self) -> usize {
        self.path_dims() + COLOR_DIMS + SIZE_DIMS
    }

    fn path_dims(&self) -> usize {
        self.prefixes.len()
    }

    /// Encode one record placed at `node`. Prefixes the catalog does not know
    /// contribute nothing.
    pub fn encode(&self, record: &PartRecord, node: &HierarchyNode) -> FeatureVector {
        let mut vector = vec![0.0; self.dims()];

        for depth in 1..=node.depth() {
            if let Some(&dim) = self.prefixes.get(&node.path[..depth]) {
                vector[dim] = self.config.level_weight(depth - 1);
            }
        }

        let base = self.path_dims();
        for (i, channel) in color::channels(&record.color).iter().enumerate() {
            vector[base + i] = channel * self.config.color_weight;
        }
        vector[base + COLOR_DIMS] = size_signal(node) * self.config.size_weight;

        vector
    }

    /// Resolve and encode every record of an inventory.
    pub fn encode_all(&self, inventory: &Inventory) -> Result<EncodedInventory<'a>> {
        let mut rows = Vec::with_capacity(inventory.len());
        let mut nodes = Vec::with_capacity(inventory.len());
        let mut warnings = Vec::new();

        for (index, record) in inventory.iter().enumerate() {
            let (node, resolved) = self.catalog.resolve_or_unknown(&record.catalog_id);
            if !resolved {
                let warning = Warning::UnresolvedPart {
                    index,
                    catalog_id: record.catalog_id.clone(),
                };
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }
            rows.push(self.encode(record, node));
            nodes.push(node);
        }

        Ok(EncodedInventory {
            matrix: FeatureMatrix::new(rows)?,
            nodes,
            warnings,
        })
    }
}

/// Stud area signal in [0, 1] from the first `A x B` label, leaf first.
pub fn size_signal(node: &HierarchyNode) -> f64 {
    node.path
        .iter()
        .rev()
        .find_map(|label| stud_dimensions(label))
        .map(|(a, b)| {
            let area = f64::from(a) * f64::from(b);
            ((area + 1.0).log2() / (SIZE_SATURATION_STUDS + 1.0).log2()).min(1.0)
        })
        .unwrap_or(0.0)
}

/// First `A x B` stud dimension in a label (`"Plate 2 x 4"` -> `(2, 4)`).
pub fn stud_dimensions(label: &str) -> Option<(u32, u32)> {
    let chars: Vec<char> = label.chars().collect();
    let digits_at = |start: usize| -> Option<(u32, usize)> {
        let end = (start..chars.len())
            .find(|&i| !chars[i].is_ascii_digit())
            .unwrap_or(chars.len());
        if end == start {
            return None;
        }
        let text: String = chars[start..end].iter().collect();
        text.parse().ok().map(|n| (n, end))
    };
    let skip_spaces = |mut i: usize| {
        while i < chars.len() && chars[i] == ' ' {
            i += 1;
        }
        i
    };

    let mut i = 0;
    while i < chars.len() {
        let starts_number = chars[i].is_ascii_digit() && (i == 0 || !chars[i - 1].is_ascii_digit());
        if starts_number {
            if let Some((a, end)) = digits_at(i) {
                let sep = skip_spaces(end);
                if sep < chars.len() && matches!(chars[sep], 'x' | 'X' | '×') {
                    if let Some((b, _)) = digits_at(skip_spaces(sep + 1)) {
                        return Some((a, b));
                    }
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }
    None
}
