//! Ordered inventory of part records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::part::PartRecord;

/// Part records in file order, with duplicate part/color entries merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PartRecord>", into = "Vec<PartRecord>")]
pub struct Inventory {
    records: Vec<PartRecord>,
    index: HashMap<(String, String), usize>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, summing its quantity into an earlier record with the
    /// same catalog id and color. Returns the index the quantity landed on.
    pub fn push(&mut self, record: PartRecord) -> usize {
        let key = (record.catalog_id.clone(), record.color.clone());
        if let Some(&existing) = self.index.get(&key) {
            let target = &mut self.records[existing];
            target.quantity = target.quantity.saturating_add(record.quantity);
            return existing;
        }
        let idx = self.records.len();
        self.index.insert(key, idx);
        self.records.push(record);
        idx
    }

    /// Records in order.
    pub fn records(&self) -> &[PartRecord] {
        &self.records
    }

    /// Record at `index`.
    pub fn get(&self, index: usize) -> Option<&PartRecord> {
        self.records.get(index)
    }

    /// Number of distinct part/color records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the inventory has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.quantity)).sum()
    }

    /// Iterate over records.
    pub fn iter(&self) -> std::slice::Iter<'_, PartRecord> {
        self.records.iter()
    }
}

impl FromIterator<PartRecord> for Inventory {
    fn from_iter<I: IntoIterator<Item = PartRecord>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for record in iter {
            inventory.push(record);
        }
        inventory
    }
}

impl From<Vec<PartRecord>> for Inventory {
    fn from(records: Vec<PartRecord>) -> Self {
        records.into_iter().collect()
    }
}

impl From<Inventory> for Vec<PartRecord> {
    fn from(inventory: Inventory) -> Self {
        inventory.records
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a PartRecord;
    type IntoIter = std::slice::Iter<'a, PartRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::InputFormat;

    fn record(id: &str, color: &str, qty: u32) -> PartRecord {
        PartRecord::new(id, color, qty, InputFormat::Tabular)
    }

    #[test]
    fn test_duplicates_are_summed_in_place() {
        let mut inventory = Inventory::new();
        inventory.push(record("3001", "4", 2));
        inventory.push(record("3004", "1", 1));
        let idx = inventory.push(record("3001", "4", 3));

        assert_eq!(idx, 0);
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.records()[0].quantity, 5);
        assert_eq!(inventory.records()[1].catalog_id, "3004");
        assert_eq!(inventory.total_quantity(), 6);
    }

    #[test]
    fn test_same_part_different_color_kept() {
        let inventory: Inventory = vec![record("3001", "4", 1), record("3001", "15", 1)]
            .into_iter()
            .collect();
        assert_eq!(inventory.len(), 2);
    }
}
