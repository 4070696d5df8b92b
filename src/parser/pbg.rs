//! LDCad part bin group parser.
//!
//! ```text
//! [options]
//! kind=basic
//! caption=Magic Shop
//! <items>
//! 3001.dat: [color=4] [count=2]
//! ```

use std::collections::HashMap;

use crate::error::{Result, SortError};
use crate::model::PartRecord;

use super::fields::{decode_text, parse_key_value, parse_quantity, Quantity};
use super::{InputFormat, InventoryParser, ParsedInventory};

/// First line of every part bin group file.
pub(super) const OPTIONS_HEADER: &str = "[options]";

const ITEMS_MARKER: &str = "<items>";
const ITEMS_END: &str = "</items>";
const PART_SUFFIX: &str = ".dat";

/// Parser for LDCad `.pbg` group records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedGroupParser;

impl InventoryParser for PackedGroupParser {
    fn format(&self) -> InputFormat {
        InputFormat::PackedGroup
    }

    fn parse(&self, raw: &[u8]) -> Result<ParsedInventory> {
        let format = self.format();
        let text = decode_text(raw, format)?;
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        match lines.next() {
            Some((_, line)) if line.eq_ignore_ascii_case(OPTIONS_HEADER) => {}
            Some((number, line)) => {
                return Err(SortError::malformed(
                    format,
                    format!("line {}", number),
                    format!("expected {}, found '{}'", OPTIONS_HEADER, line),
                ))
            }
            None => return Err(SortError::malformed(format, "line 1", "missing [options] header")),
        }

        let mut options = HashMap::new();
        let mut last_line = 1;
        let mut in_items = false;
        for (number, line) in lines.by_ref() {
            last_line = number;
            if line.eq_ignore_ascii_case(ITEMS_MARKER) {
                in_items = true;
                break;
            }
            if is_comment(line) {
                continue;
            }
            match parse_key_value(line) {
                Some((key, value)) => {
                    options.insert(key.to_lowercase(), value.to_string());
                }
                None => {
                    return Err(SortError::malformed(
                        format,
                        format!("line {}", number),
                        format!("unrecognized option line '{}'", line),
                    ))
                }
            }
        }
        if !in_items {
            return Err(SortError::malformed(
                format,
                format!("line {}", last_line),
                "truncated input: missing <items> section",
            ));
        }
        if let Some(caption) = options.get("caption") {
            tracing::debug!("Part bin group '{}'", caption);
        }

        let mut parsed = ParsedInventory::new();
        for (number, line) in lines {
            if line.eq_ignore_ascii_case(ITEMS_END) {
                break;
            }
            if is_comment(line) {
                continue;
            }
            let location = format!("line {}", number);
            let group = parse_group_record(line)
                .map_err(|m| SortError::malformed(format, &location, m))?;
            match group.count {
                Quantity::Accepted(count) => {
                    parsed.accept(PartRecord::new(group.part, group.color, count, format))
                }
                Quantity::NonPositive(count) => parsed.reject(
                    format,
                    location,
                    format!("part {} has non-positive count {}", group.part, count),
                ),
            }
        }

        tracing::debug!("Parsed {} group record(s)", parsed.inventory.len());
        Ok(parsed)
    }
}

/// One `<part>.dat: [color=n] [count=n]` record.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupRecord {
    part: String,
    color: String,
    count: Quantity,
}

fn is_comment(line: &str) -> bool {
    line.starts_with(';') || line.starts_with("//")
}

fn parse_group_record(line: &str) -> std::result::Result<GroupRecord, String> {
    let lower = line.to_ascii_lowercase();
    let suffix = lower
        .find(PART_SUFFIX)
        .ok_or_else(|| format!("unrecognized group header '{}'", line))?;
    let part = line[..suffix].trim();
    if part.is_empty() || part.starts_with('[') || part.starts_with('<') {
        return Err(format!("unrecognized group header '{}'", line));
    }

    let mut tags = HashMap::new();
    let mut rest = &line[suffix + PART_SUFFIX.len()..];
    while let Some(open) = rest.find('[') {
        let close = rest[open..]
            .find(']')
            .ok_or_else(|| format!("truncated group record for part {}", part))?;
        let tag = &rest[open + 1..open + close];
        if let Some((key, value)) = parse_key_value(tag) {
            tags.insert(key.to_ascii_lowercase(), value);
        }
        rest = &rest[open + close + 1..];
    }

    let color = tags
        .get("color")
        .ok_or_else(|| format!("truncated group record for part {}: missing color", part))?;
    let count = tags
        .get("count")
        .ok_or_else(|| format!("truncated group record for part {}: missing count", part))?;

    Ok(GroupRecord {
        part: part.to_string(),
        color: color.to_string(),
        count: parse_quantity(count)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GROUP: &str = "[options]
kind=basic
caption=Set 6020-1 - Magic Shop
description=Parts in set 6020-1
sortOn=description
<items>
3001.dat: [color=4] [count=2]
3626cpr0001.dat: [color=14] [count=1]
3001.dat: [color=4] [count=1]
";

    fn parse(text: &str) -> Result<ParsedInventory> {
        PackedGroupParser.parse(text.as_bytes())
    }

    #[test]
    fn test_parse_group() {
        let parsed = parse(GROUP).unwrap();
        assert_eq!(
            parsed.inventory.records(),
            &[
                PartRecord::new("3001", "4", 3, InputFormat::PackedGroup),
                PartRecord::new("3626cpr0001", "14", 1, InputFormat::PackedGroup),
            ]
        );
    }

    #[test]
    fn test_parse_group_record() {
        let record = parse_group_record("3001.dat [color=4] [count=12]").unwrap();
        assert_eq!(record.part, "3001");
        assert_eq!(record.color, "4");
        assert_eq!(record.count, Quantity::Accepted(12));
    }

    #[test]
    fn test_missing_options_header() {
        let err = parse("<items>\n3001.dat: [color=4] [count=2]\n").unwrap_err();
        assert!(matches!(err, SortError::MalformedInput { ref location, .. } if location == "line 1"));
    }

    #[test]
    fn test_missing_items_marker_is_truncated() {
        let err = parse("[options]\nkind=basic\n").unwrap_err();
        match err {
            SortError::MalformedInput { message, .. } => assert!(message.contains("truncated")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_record() {
        let err = parse("[options]\n<items>\n3001.dat: [color=4] [cou").unwrap_err();
        assert!(matches!(err, SortError::MalformedInput { ref location, .. } if location == "line 3"));

        let err = parse("[options]\n<items>\n3001.dat: [color=4]\n").unwrap_err();
        match err {
            SortError::MalformedInput { message, .. } => assert!(message.contains("missing count")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unrecognized_group_header() {
        let err = parse("[options]\n<items>\n[color=4] [count=2]\n").unwrap_err();
        match err {
            SortError::MalformedInput { message, .. } => {
                assert!(message.contains("unrecognized group header"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unrecognized_option_line() {
        assert!(parse("[options]\nthis is not an option\n<items>\n").is_err());
    }

    #[test]
    fn test_zero_count_rejected() {
        let parsed = parse("[options]\n<items>\n3001.dat: [color=4] [count=0]\n").unwrap();
        assert!(parsed.inventory.is_empty());
        assert_eq!(parsed.warnings.len(), 1);
    }
}
