//! Data model types for inventory clustering.

mod inventory;
mod part;

pub use inventory::Inventory;
pub use part::{design_id, PartRecord};
