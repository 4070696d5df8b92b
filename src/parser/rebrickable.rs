//! Rebrickable API set-parts response parser.

use serde::Deserialize;

use crate::error::{Result, SortError};
use crate::model::PartRecord;

use super::fields::{decode_text, Quantity};
use super::{InputFormat, InventoryParser, ParsedInventory};

#[derive(Debug, Deserialize)]
struct SetPartsPage {
    results: Vec<SetPart>,
}

#[derive(Debug, Deserialize)]
struct SetPart {
    part: PartRef,
    color: ColorRef,
    quantity: i64,
    #[serde(default)]
    is_spare: bool,
}

#[derive(Debug, Deserialize)]
struct PartRef {
    part_num: String,
}

#[derive(Debug, Deserialize)]
struct ColorRef {
    id: i64,
}

/// Parser for `GET /api/v3/lego/sets/{set}/parts/` responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RebrickableJsonParser;

impl InventoryParser for RebrickableJsonParser {
    fn format(&self) -> InputFormat {
        InputFormat::RebrickableJson
    }

    fn parse(&self, raw: &[u8]) -> Result<ParsedInventory> {
        let format = self.format();
        let text = decode_text(raw, format)?;
        let page: SetPartsPage = serde_json::from_str(text).map_err(|e| {
            SortError::malformed(
                format,
                format!("line {}, column {}", e.line(), e.column()),
                e.to_string(),
            )
        })?;

        let mut parsed = ParsedInventory::new();
        let mut spares = 0usize;
        for (idx, entry) in page.results.into_iter().enumerate() {
            let location = format!("result {}", idx + 1);
            if entry.part.part_num.trim().is_empty() {
                return Err(SortError::malformed(format, location, "empty part_num"));
            }
            if entry.is_spare {
                spares += 1;
            }
            let quantity = if entry.quantity <= 0 {
                Quantity::NonPositive(entry.quantity)
            } else {
                u32::try_from(entry.quantity).map(Quantity::Accepted).map_err(|_| {
                    SortError::malformed(
                        format,
                        &location,
                        format!("quantity {} is too large", entry.quantity),
                    )
                })?
            };
            match quantity {
                Quantity::Accepted(qty) => parsed.accept(PartRecord::new(
                    entry.part.part_num,
                    entry.color.id.to_string(),
                    qty,
                    format,
                )),
                Quantity::NonPositive(qty) => parsed.reject(
                    format,
                    location,
                    format!("part {} has non-positive quantity {}", entry.part.part_num, qty),
                ),
            }
        }

        tracing::debug!(
            "Parsed {} Rebrickable record(s), {} spare entr(ies)",
            parsed.inventory.len(),
            spares
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RESPONSE: &str = r#"{
        "count": 3,
        "next": null,
        "previous": null,
        "results": [
            {"id": 1, "inv_part_id": 11, "part": {"part_num": "3001", "name": "Brick 2 x 4"},
             "color": {"id": 4, "name": "Red"}, "set_num": "6020-1", "quantity": 2, "is_spare": false},
            {"id": 2, "inv_part_id": 12, "part": {"part_num": "3001", "name": "Brick 2 x 4"},
             "color": {"id": 4, "name": "Red"}, "set_num": "6020-1", "quantity": 1, "is_spare": true},
            {"id": 3, "inv_part_id": 13, "part": {"part_num": "3023", "name": "Plate 1 x 2"},
             "color": {"id": 15, "name": "White"}, "set_num": "6020-1", "quantity": 6, "is_spare": false}
        ]
    }"#;

    #[test]
    fn test_parse_response() {
        let parsed = RebrickableJsonParser.parse(RESPONSE.as_bytes()).unwrap();
        assert_eq!(
            parsed.inventory.records(),
            &[
                PartRecord::new("3001", "4", 3, InputFormat::RebrickableJson),
                PartRecord::new("3023", "15", 6, InputFormat::RebrickableJson),
            ]
        );
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = RebrickableJsonParser
            .parse(br#"{"count": 1, "results": [{"part": {"part_num": "3001"}, "quantity": 1}]}"#)
            .unwrap_err();
        assert!(matches!(err, SortError::MalformedInput { .. }));
    }

    #[test]
    fn test_invalid_json() {
        assert!(RebrickableJsonParser.parse(b"{\"count\": ").is_err());
    }
}
