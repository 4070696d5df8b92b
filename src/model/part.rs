//! Canonical part record shared by every input format.

use serde::{Deserialize, Serialize};

use crate::parser::InputFormat;

/// One part/color combination with the quantity owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    /// Catalog identifier (Rebrickable / BrickLink part number).
    pub catalog_id: String,
    /// Color code as written in the source file.
    pub color: String,
    /// Count owned, always at least 1.
    pub quantity: u32,
    /// Parser that produced the record.
    pub source_format: InputFormat,
}

impl PartRecord {
    /// Create a new part record.
    pub fn new(
        catalog_id: impl Into<String>,
        color: impl Into<String>,
        quantity: u32,
        source_format: InputFormat,
    ) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            color: color.into(),
            quantity,
            source_format,
        }
    }

    /// Leading digits of the catalog id, naming the mould without print or
    /// variant suffixes (`3626cpr0001` -> `3626`).
    pub fn design_id(&self) -> Option<&str> {
        design_id(&self.catalog_id)
    }

    /// Key used to merge duplicate entries.
    pub fn key(&self) -> (&str, &str) {
        (&self.catalog_id, &self.color)
    }
}

/// Leading ASCII digits of a catalog id, if any.
pub fn design_id(catalog_id: &str) -> Option<&str> {
    let end = catalog_id
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(catalog_id.len());
    if end == 0 {
        None
    } else {
        Some(&catalog_id[..end])
    }
}
