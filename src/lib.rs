//! assorted-bricks - Cluster LEGO part inventories into storage bins.
//!
//! Inventories exported by Rebrickable, BrickStore, LDCad or the Rebrickable
//! API are parsed into part records, placed in a category hierarchy, encoded
//! as feature vectors and grouped with seeded K-Means. Each bin is labelled
//! with the category its parts share.
//!
//! # Example
//!
//! ```no_run
//! use assorted_bricks::{cluster_inventory, HierarchyCatalog, InputFormat};
//! use std::path::Path;
//!
//! let catalog = HierarchyCatalog::from_path(Path::new("catalog.json")).unwrap();
//! let raw = std::fs::read("parts.csv").unwrap();
//! let result = cluster_inventory(&raw, InputFormat::Tabular, &catalog, 10, Some(0)).unwrap();
//! for bin in result.non_empty_clusters() {
//!     println!("{} ({})", bin.label, bin.quantity);
//! }
//! ```

pub mod assembler;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;

// Re-exports for convenience
pub use assembler::{assemble, ClusterSummary, ClusteringResult, FitStats, Placement};
pub use catalog::{HierarchyCatalog, HierarchyNode, Resolution, SetCache, SetSource};
pub use cluster::{Cluster, ClusterFit, KMeans};
pub use config::{ClusterConfig, EncoderConfig, DEFAULT_CLUSTERS, DEFAULT_SEED};
pub use diagnostics::Diagnostics;
pub use encoder::{FeatureEncoder, FeatureMatrix, FeatureVector};
pub use error::{ErrorCode, Result, SortError, Warning};
pub use model::{Inventory, PartRecord};
pub use parser::{parse_inventory_file, InputFormat, InventoryParser, ParsedInventory};
pub use pipeline::{cluster_inventory, parse_seed, Pipeline};

/// Cluster an inventory file with default settings.
///
/// The format is inferred when `format` is `None`.
pub fn cluster_inventory_file(
    input_path: &std::path::Path,
    format: Option<InputFormat>,
    catalog: &HierarchyCatalog,
    k: usize,
    seed: Option<u64>,
) -> Result<ClusteringResult> {
    if k < 1 {
        return Err(SortError::invalid_parameter(
            "k",
            "cluster count must be at least 1",
        ));
    }
    let parsed = parse_inventory_file(input_path, format)?;
    Pipeline::new(catalog).run_parsed(parsed, k, seed)
}
