//! Inventory file parsers.
//!
//! Every supported format is a concrete [`InventoryParser`]; [`InputFormat`]
//! names them and dispatches to the right one.

pub(crate) mod fields;
mod markup;
mod pbg;
mod rebrickable;
mod tabular;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SortError, Warning};
use crate::model::{Inventory, PartRecord};

pub use markup::MarkupParser;
pub use pbg::PackedGroupParser;
pub use rebrickable::RebrickableJsonParser;
pub use tabular::TabularParser;

/// Supported inventory formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    /// Delimited rows with named columns (Rebrickable CSV export).
    Tabular,
    /// Nested item elements (BrickStore XML).
    Markup,
    /// Group records under an `<items>` marker (LDCad part bin group).
    PackedGroup,
    /// Rebrickable API set-parts response.
    RebrickableJson,
}

impl InputFormat {
    /// All formats, in detection order.
    pub const ALL: [InputFormat; 4] = [
        InputFormat::Markup,
        InputFormat::PackedGroup,
        InputFormat::RebrickableJson,
        InputFormat::Tabular,
    ];

    /// Parser for this format.
    pub fn parser(self) -> &'static dyn InventoryParser {
        match self {
            InputFormat::Tabular => &TabularParser,
            InputFormat::Markup => &MarkupParser,
            InputFormat::PackedGroup => &PackedGroupParser,
            InputFormat::RebrickableJson => &RebrickableJsonParser,
        }
    }

    /// Parse raw bytes in this format.
    pub fn parse(self, raw: &[u8]) -> Result<ParsedInventory> {
        self.parser().parse(raw)
    }

    /// Usual file extension.
    pub fn extension(self) -> &'static str {
        match self {
            InputFormat::Tabular => "csv",
            InputFormat::Markup => "bsx",
            InputFormat::PackedGroup => "pbg",
            InputFormat::RebrickableJson => "json",
        }
    }

    /// Map a file extension to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "csv" | "tsv" => Some(InputFormat::Tabular),
            "bsx" | "xml" => Some(InputFormat::Markup),
            "pbg" => Some(InputFormat::PackedGroup),
            "json" => Some(InputFormat::RebrickableJson),
            _ => None,
        }
    }

    /// Guess the format from the leading bytes of a payload.
    pub fn detect(raw: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(raw);
        let head = text.trim_start_matches('\u{feff}').trim_start();

        if head.starts_with('<') {
            Some(InputFormat::Markup)
        } else if head.starts_with(pbg::OPTIONS_HEADER) {
            Some(InputFormat::PackedGroup)
        } else if head.starts_with('{') {
            Some(InputFormat::RebrickableJson)
        } else if head.lines().next().is_some_and(tabular::looks_like_header) {
            Some(InputFormat::Tabular)
        } else {
            None
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Tabular => write!(f, "tabular"),
            InputFormat::Markup => write!(f, "markup"),
            InputFormat::PackedGroup => write!(f, "packed-group"),
            InputFormat::RebrickableJson => write!(f, "rebrickable-json"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tabular" | "csv" => Ok(InputFormat::Tabular),
            "markup" | "xml" | "bsx" => Ok(InputFormat::Markup),
            "packed-group" | "pbg" => Ok(InputFormat::PackedGroup),
            "rebrickable-json" | "json" => Ok(InputFormat::RebrickableJson),
            other => Err(SortError::invalid_parameter(
                "format",
                format!("unknown input format '{}'", other),
            )),
        }
    }
}

/// Common parsing capability of every input format.
pub trait InventoryParser: Send + Sync {
    /// Format handled by this parser.
    fn format(&self) -> InputFormat;

    /// Parse a raw payload into part records.
    ///
    /// Structural problems abort with [`SortError::MalformedInput`];
    /// individually rejected records are reported as warnings.
    fn parse(&self, raw: &[u8]) -> Result<ParsedInventory>;
}

/// Parser output: the inventory plus per-record warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInventory {
    pub inventory: Inventory,
    pub warnings: Vec<Warning>,
}

impl ParsedInventory {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accepted record.
    pub fn accept(&mut self, record: PartRecord) {
        self.inventory.push(record);
    }

    /// Report a record dropped by the parser.
    pub fn reject(
        &mut self,
        format: InputFormat,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) {
        let warning = Warning::RejectedRecord {
            format,
            location: location.into(),
            reason: reason.into(),
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Parse an inventory file from a path.
///
/// The format is taken from `format`, else from the file extension, else
/// sniffed from the content.
pub fn parse_inventory_file(path: &Path, format: Option<InputFormat>) -> Result<ParsedInventory> {
    use std::fs;

    if !path.exists() {
        return Err(SortError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = fs::read(path)?;
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(SortError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    let format = format
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(InputFormat::from_extension)
        })
        .or_else(|| InputFormat::detect(&raw))
        .ok_or_else(|| {
            SortError::invalid_parameter(
                "format",
                format!("cannot determine the format of {}", path.display()),
            )
        })?;

    tracing::debug!("Parsing {} as {}", path.display(), format);
    format.parse(&raw)
}
