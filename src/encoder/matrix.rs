//! Feature vectors and the matrix handed to the cluster engine.

use std::collections::HashSet;

use crate::error::{Result, SortError};

/// Numeric features of one part record.
pub type FeatureVector = Vec<f64>;

/// Feature vectors aligned with an inventory, all of the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureVector>,
    dims: usize,
}

impl FeatureMatrix {
    /// Build a matrix, checking every row has the same length.
    pub fn new(rows: Vec<FeatureVector>) -> Result<Self> {
        let dims = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dims) {
            return Err(SortError::invalid_parameter(
                "features",
                format!(
                    "row {} has {} dimensions, expected {}",
                    idx,
                    row.len(),
                    dims
                ),
            ));
        }
        if let Some(idx) = rows.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(SortError::invalid_parameter(
                "features",
                format!("row {} contains a non-finite value", idx),
            ));
        }
        Ok(Self { rows, dims })
    }

    /// Rows in inventory order.
    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Vector length shared by every row.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of distinct rows.
    pub fn distinct_rows(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().map(|v| (v + 0.0).to_bits()).collect::<Vec<u64>>())
            .collect::<HashSet<_>>()
            .len()
    }
}
