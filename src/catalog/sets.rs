//! Set inventories resolved by set number.

use std::path::{Path, PathBuf};

use crate::error::{Result, SortError};
use crate::parser::{InputFormat, ParsedInventory};

/// Anything that can turn a set number into an inventory.
pub trait SetSource {
    /// Inventory of `set_number`.
    fn inventory(&self, set_number: &str) -> Result<ParsedInventory>;
}

/// Validate a set number and add the default `-1` variant suffix.
pub fn normalize_set_number(set_number: &str) -> Result<String> {
    let set_number = set_number.trim();
    if set_number.len() < 4 {
        return Err(SortError::invalid_parameter(
            "set",
            format!("'{}' is not a valid set number", set_number),
        ));
    }
    if !set_number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(SortError::invalid_parameter(
            "set",
            format!("'{}' contains invalid characters", set_number),
        ));
    }
    if set_number.contains('-') {
        Ok(set_number.to_string())
    } else {
        Ok(format!("{}-1", set_number))
    }
}

/// Directory of Rebrickable set-parts responses saved as `<set>.json`.
#[derive(Debug, Clone)]
pub struct SetCache {
    dir: PathBuf,
}

impl SetCache {
    /// Create a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a normalized set number.
    pub fn path_for(&self, set_number: &str) -> PathBuf {
        self.dir.join(format!("{}.json", set_number))
    }
}

impl SetSource for SetCache {
    fn inventory(&self, set_number: &str) -> Result<ParsedInventory> {
        let set_number = normalize_set_number(set_number)?;
        let path = self.path_for(&set_number);
        if !path.exists() {
            tracing::debug!("Set {} is not cached in {}", set_number, self.dir().display());
            return Err(SortError::UnknownSet { set_number });
        }
        tracing::debug!("Loading set {} from {}", set_number, path.display());
        let raw = std::fs::read(&path)?;
        InputFormat::RebrickableJson.parse(&raw)
    }
}
