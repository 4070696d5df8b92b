//! Error and warning types for inventory clustering.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::InputFormat;

/// Error codes for pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// File not found (-1)
    FileNotFound = -1,
    /// Empty file (-2)
    EmptyFile = -2,
    /// Input does not match its declared format (-3)
    MalformedInput = -3,
    /// Inventory has no records (-4)
    EmptyInventory = -4,
    /// Bad cluster count or seed (E100)
    InvalidParameter = 100,
    /// Hierarchy catalog could not be built (E200)
    Catalog = 200,
    /// Set number has no cached inventory (E300)
    UnknownSet = 300,
}

/// Main error type for the pipeline.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Empty file: {path}")]
    EmptyFile { path: PathBuf },

    #[error("Malformed {format} input at {location}: {message}")]
    MalformedInput {
        format: InputFormat,
        location: String,
        message: String,
    },

    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Inventory contains no parts")]
    EmptyInventory,

    #[error("Invalid hierarchy catalog: {message}")]
    Catalog { message: String },

    #[error("No inventory available for set {set_number}")]
    UnknownSet { set_number: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SortError {
    /// Build a [`SortError::MalformedInput`].
    pub fn malformed(
        format: InputFormat,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SortError::MalformedInput {
            format,
            location: location.into(),
            message: message.into(),
        }
    }

    /// Build a [`SortError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        SortError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SortError::FileNotFound { .. } => ErrorCode::FileNotFound,
            SortError::EmptyFile { .. } => ErrorCode::EmptyFile,
            SortError::MalformedInput { .. } => ErrorCode::MalformedInput,
            SortError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            SortError::EmptyInventory => ErrorCode::EmptyInventory,
            SortError::Catalog { .. } => ErrorCode::Catalog,
            SortError::UnknownSet { .. } => ErrorCode::UnknownSet,
            SortError::Io(_) => ErrorCode::FileNotFound,
        }
    }

    /// Get the numeric error code value.
    pub fn code_value(&self) -> i32 {
        self.code() as i32
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SortError>;

/// Non-fatal issue attached to a best-effort result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Catalog id not present in the hierarchy; the part was clustered under
    /// the unknown leaf.
    UnresolvedPart { index: usize, catalog_id: String },
    /// A single record was dropped by its parser.
    RejectedRecord {
        format: InputFormat,
        location: String,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedPart { index, catalog_id } => write!(
                f,
                "Part {} ({}) not found in hierarchy, placed under Unknown",
                index + 1,
                catalog_id
            ),
            Warning::RejectedRecord {
                format,
                location,
                reason,
            } => write!(f, "Rejected {} record at {}: {}", format, location, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SortError::EmptyInventory.code_value(), -4);
        assert_eq!(
            SortError::invalid_parameter("k", "must be at least 1").code(),
            ErrorCode::InvalidParameter
        );
        let err = SortError::malformed(InputFormat::Tabular, "line 3", "bad quantity");
        assert_eq!(err.code(), ErrorCode::MalformedInput);
        assert_eq!(
            err.to_string(),
            "Malformed tabular input at line 3: bad quantity"
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::UnresolvedPart {
            index: 0,
            catalog_id: "99999".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "Part 1 (99999) not found in hierarchy, placed under Unknown"
        );
    }
}
