//! Warning collection across a pipeline run.

use serde::{Deserialize, Serialize};

use crate::error::Warning;

/// Warnings gathered while producing a best-effort result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning.
    pub fn add(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Add several warnings in order.
    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        self.warnings.extend(warnings);
    }

    /// Merge another collection into this one.
    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    /// All warnings in the order they were raised.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of parts that fell back to the unknown leaf.
    pub fn unresolved_count(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::UnresolvedPart { .. }))
            .count()
    }

    /// Number of records dropped by a parser.
    pub fn rejected_count(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::RejectedRecord { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

impl From<Vec<Warning>> for Diagnostics {
    fn from(warnings: Vec<Warning>) -> Self {
        Self { warnings }
    }
}
