//! Reference data consumed by the pipeline: the category hierarchy and
//! cached set inventories.

mod hierarchy;
mod sets;

pub use hierarchy::{display_label, HierarchyCatalog, HierarchyNode, Resolution};
pub use sets::{normalize_set_number, SetCache, SetSource};
