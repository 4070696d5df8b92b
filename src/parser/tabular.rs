//! Delimited-row parser (Rebrickable CSV export).

use crate::error::{Result, SortError};
use crate::model::PartRecord;

use super::fields::{decode_text, normalize_name, parse_quantity, Quantity};
use super::{InputFormat, InventoryParser, ParsedInventory};

const PART_COLUMNS: [&str; 6] = ["part", "partnum", "partid", "partnumber", "itemid", "designid"];
const COLOR_COLUMNS: [&str; 4] = ["color", "colorid", "colour", "colourid"];
const QUANTITY_COLUMNS: [&str; 3] = ["quantity", "qty", "count"];

/// Parser for delimited rows with a named header.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularParser;

impl InventoryParser for TabularParser {
    fn format(&self) -> InputFormat {
        InputFormat::Tabular
    }

    fn parse(&self, raw: &[u8]) -> Result<ParsedInventory> {
        let format = self.format();
        let text = decode_text(raw, format)?;
        let mut rows = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (header_idx, header_line) = rows
            .next()
            .ok_or_else(|| SortError::malformed(format, "line 1", "missing header row"))?;
        let delimiter = detect_delimiter(header_line);
        let header = split_row(header_line, delimiter)
            .map_err(|m| SortError::malformed(format, line_location(header_idx), m))?;
        let columns = Columns::locate(&header)
            .map_err(|m| SortError::malformed(format, line_location(header_idx), m))?;

        let mut parsed = ParsedInventory::new();
        for (idx, line) in rows {
            let location = line_location(idx);
            let fields = split_row(line, delimiter)
                .map_err(|m| SortError::malformed(format, &location, m))?;
            if fields.len() != header.len() {
                return Err(SortError::malformed(
                    format,
                    location,
                    format!("expected {} fields, found {}", header.len(), fields.len()),
                ));
            }

            let part = &fields[columns.part];
            if part.is_empty() {
                return Err(SortError::malformed(format, location, "empty part id"));
            }
            let color = &fields[columns.color];
            let quantity = parse_quantity(&fields[columns.quantity])
                .map_err(|m| SortError::malformed(format, &location, m))?;

            match quantity {
                Quantity::Accepted(qty) => {
                    parsed.accept(PartRecord::new(part.as_str(), color.as_str(), qty, format))
                }
                Quantity::NonPositive(qty) => parsed.reject(
                    format,
                    location,
                    format!("part {} has non-positive quantity {}", part, qty),
                ),
            }
        }

        tracing::debug!(
            "Parsed {} tabular record(s), {} rejected",
            parsed.inventory.len(),
            parsed.warnings.len()
        );
        Ok(parsed)
    }
}

/// Positions of the required columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    part: usize,
    color: usize,
    quantity: usize,
}

impl Columns {
    fn locate(header: &[String]) -> std::result::Result<Self, String> {
        let names: Vec<String> = header.iter().map(|h| normalize_name(h)).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));

        let mut missing = Vec::new();
        let part = find(&PART_COLUMNS);
        let color = find(&COLOR_COLUMNS);
        let quantity = find(&QUANTITY_COLUMNS);
        if part.is_none() {
            missing.push("part");
        }
        if color.is_none() {
            missing.push("color");
        }
        if quantity.is_none() {
            missing.push("quantity");
        }

        match (part, color, quantity) {
            (Some(part), Some(color), Some(quantity)) => Ok(Self {
                part,
                color,
                quantity,
            }),
            _ => Err(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )),
        }
    }
}

/// Whether a line reads as a tabular header.
pub(super) fn looks_like_header(line: &str) -> bool {
    split_row(line, detect_delimiter(line))
        .map(|fields| Columns::locate(&fields).is_ok())
        .unwrap_or(false)
}

fn line_location(idx: usize) -> String {
    format!("line {}", idx + 1)
}

/// Pick the delimiter that occurs most in the header (comma by default).
fn detect_delimiter(header: &str) -> char {
    [',', '\t', ';']
        .into_iter()
        .map(|d| (d, header.matches(d).count()))
        .fold((',', 0), |best, cur| if cur.1 > best.1 { cur } else { best })
        .0
}

/// Split a row on `delimiter`, honoring double-quoted fields.
fn split_row(line: &str, delimiter: char) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && current.trim().is_empty() {
            current.clear();
            in_quotes = true;
        } else if c == delimiter {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current.trim().to_string());
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warning;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<ParsedInventory> {
        TabularParser.parse(text.as_bytes())
    }

    #[test]
    fn test_parse_rebrickable_csv() {
        let parsed = parse("Part,Color,Quantity\n3001,4,2\n3004,15,6\n").unwrap();
        let records = parsed.inventory.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], PartRecord::new("3001", "4", 2, InputFormat::Tabular));
        assert_eq!(records[1], PartRecord::new("3004", "15", 6, InputFormat::Tabular));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_header_aliases_and_column_order() {
        let parsed = parse("qty;color_id;part_num;Is Spare\n3;1;3020;False\n").unwrap();
        assert_eq!(
            parsed.inventory.records()[0],
            PartRecord::new("3020", "1", 3, InputFormat::Tabular)
        );
    }

    #[test]
    fn test_quoted_fields() {
        let parsed = parse("Part,Color,Quantity\n\"973pr1\",\"4\",\"1\"\n").unwrap();
        assert_eq!(parsed.inventory.records()[0].catalog_id, "973pr1");
    }

    #[test]
    fn test_missing_column() {
        let err = parse("Part,Quantity\n3001,2\n").unwrap_err();
        match err {
            SortError::MalformedInput {
                location, message, ..
            } => {
                assert_eq!(location, "line 1");
                assert!(message.contains("color"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(parse(""), Err(SortError::MalformedInput { .. })));
    }

    #[test]
    fn test_header_only_is_empty() {
        let parsed = parse("Part,Color,Quantity\n").unwrap();
        assert!(parsed.inventory.is_empty());
    }

    #[test]
    fn test_non_positive_quantity_rejected_individually() {
        let parsed = parse("Part,Color,Quantity\n3001,4,2\n3002,4,0\n3003,4,-1\n3004,4,1\n").unwrap();
        assert_eq!(parsed.inventory.len(), 2);
        assert_eq!(parsed.warnings.len(), 2);
        assert!(matches!(
            &parsed.warnings[0],
            Warning::RejectedRecord { location, .. } if location == "line 3"
        ));
    }

    #[test]
    fn test_non_integer_quantity_is_malformed() {
        let err = parse("Part,Color,Quantity\n3001,4,lots\n").unwrap_err();
        assert!(matches!(
            err,
            SortError::MalformedInput { ref location, .. } if location == "line 2"
        ));
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        assert!(parse("Part,Color,Quantity\n3001,4\n").is_err());
    }

    #[test]
    fn test_duplicates_summed() {
        let parsed = parse("Part,Color,Quantity\n3001,4,2\n3001,4,3\n").unwrap();
        assert_eq!(parsed.inventory.len(), 1);
        assert_eq!(parsed.inventory.records()[0].quantity, 5);
    }

    #[test]
    fn test_split_row() {
        assert_eq!(
            split_row("a, \"b,c\" ,\"d\"\"e\"", ','),
            Ok(vec!["a".to_string(), "b,c".to_string(), "d\"e".to_string()])
        );
        assert!(split_row("\"open", ',').is_err());
    }
}
