//! Nested-element parser (BrickStore XML).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, SortError};
use crate::model::PartRecord;

use super::fields::{decode_text, normalize_name, parse_quantity, Quantity};
use super::{InputFormat, InventoryParser, ParsedInventory};

const ITEM_ELEMENT: &str = "item";

/// Item fields, by element or attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Part,
    Color,
    Quantity,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match normalize_name(name).as_str() {
            "itemid" | "partid" | "part" | "id" => Some(Field::Part),
            "colorid" | "color" | "colour" => Some(Field::Color),
            "qty" | "quantity" | "count" => Some(Field::Quantity),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Part => "ItemID",
            Field::Color => "ColorID",
            Field::Quantity => "Qty",
        }
    }
}

/// Fields collected for the item currently open.
#[derive(Debug, Default)]
struct ItemBuilder {
    number: usize,
    part: Option<String>,
    color: Option<String>,
    quantity: Option<String>,
    /// Child element whose text is being read.
    reading: Option<Field>,
}

impl ItemBuilder {
    fn new(number: usize) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    fn location(&self) -> String {
        format!("item {}", self.number)
    }

    fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Part => &mut self.part,
            Field::Color => &mut self.color,
            Field::Quantity => &mut self.quantity,
        };
        slot.get_or_insert_with(String::new).push_str(value.trim());
    }

    fn finish(self, parsed: &mut ParsedInventory) -> Result<()> {
        let format = InputFormat::Markup;
        let location = self.location();
        let missing = |field: Field| {
            SortError::malformed(
                format,
                location.clone(),
                format!("missing required field {}", field.label()),
            )
        };

        let part = self
            .part
            .filter(|p| !p.is_empty())
            .ok_or_else(|| missing(Field::Part))?;
        let color = self.color.ok_or_else(|| missing(Field::Color))?;
        let quantity = self.quantity.ok_or_else(|| missing(Field::Quantity))?;
        let quantity = parse_quantity(&quantity)
            .map_err(|m| SortError::malformed(format, location.clone(), m))?;

        match quantity {
            Quantity::Accepted(qty) => parsed.accept(PartRecord::new(part, color, qty, format)),
            Quantity::NonPositive(qty) => parsed.reject(
                format,
                location,
                format!("part {} has non-positive quantity {}", part, qty),
            ),
        }
        Ok(())
    }
}

/// Parser for a root element with repeated item elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupParser;

impl InventoryParser for MarkupParser {
    fn format(&self) -> InputFormat {
        InputFormat::Markup
    }

    fn parse(&self, raw: &[u8]) -> Result<ParsedInventory> {
        let format = self.format();
        let text = decode_text(raw, format)?;
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut parsed = ParsedInventory::new();
        let mut open: Vec<String> = Vec::new();
        let mut item: Option<ItemBuilder> = None;
        let mut items_seen = 0usize;
        let mut saw_root = false;

        loop {
            let position = reader.buffer_position();
            let syntax_error = |message: String| {
                SortError::malformed(format, format!("byte {}", position), message)
            };

            match reader.read_event() {
                Ok(Event::Start(element)) => {
                    let name = element_name(&element);
                    saw_root = true;
                    if name.eq_ignore_ascii_case(ITEM_ELEMENT) && item.is_none() {
                        items_seen += 1;
                        let mut builder = ItemBuilder::new(items_seen);
                        read_attributes(&element, &mut builder)?;
                        item = Some(builder);
                    } else if let Some(builder) = item.as_mut() {
                        builder.reading = Field::from_name(&name);
                    }
                    open.push(name);
                }
                Ok(Event::Empty(element)) => {
                    let name = element_name(&element);
                    saw_root = true;
                    if name.eq_ignore_ascii_case(ITEM_ELEMENT) && item.is_none() {
                        items_seen += 1;
                        let mut builder = ItemBuilder::new(items_seen);
                        read_attributes(&element, &mut builder)?;
                        builder.finish(&mut parsed)?;
                    } else if let (Some(builder), Some(field)) = (item.as_mut(), Field::from_name(&name)) {
                        builder.set(field, "");
                    }
                }
                Ok(Event::Text(content)) => {
                    if let Some(builder) = item.as_mut() {
                        if let Some(field) = builder.reading {
                            let value = content
                                .unescape()
                                .map_err(|e| SortError::malformed(format, builder.location(), e.to_string()))?;
                            builder.set(field, &value);
                        }
                    }
                }
                Ok(Event::CData(content)) => {
                    if let Some(builder) = item.as_mut() {
                        if let Some(field) = builder.reading {
                            let value = std::str::from_utf8(&content)
                                .map_err(|e| SortError::malformed(format, builder.location(), e.to_string()))?;
                            builder.set(field, value);
                        }
                    }
                }
                Ok(Event::End(element)) => {
                    let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                    match open.pop() {
                        Some(expected) if expected == name => {}
                        Some(expected) => {
                            return Err(syntax_error(format!(
                                "expected </{}>, found </{}>",
                                expected, name
                            )))
                        }
                        None => return Err(syntax_error(format!("unexpected </{}>", name))),
                    }

                    let closes_item = name.eq_ignore_ascii_case(ITEM_ELEMENT)
                        && item.is_some()
                        && !open.iter().any(|n| n.eq_ignore_ascii_case(ITEM_ELEMENT));
                    if closes_item {
                        if let Some(builder) = item.take() {
                            builder.finish(&mut parsed)?;
                        }
                    } else if let Some(builder) = item.as_mut() {
                        builder.reading = None;
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(syntax_error(e.to_string())),
            }
        }

        if let Some(unclosed) = open.last() {
            let location = item
                .as_ref()
                .map(ItemBuilder::location)
                .unwrap_or_else(|| "end of input".to_string());
            return Err(SortError::malformed(
                format,
                location,
                format!("unclosed element <{}>", unclosed),
            ));
        }
        if !saw_root {
            return Err(SortError::malformed(format, "byte 0", "missing root element"));
        }

        tracing::debug!(
            "Parsed {} markup item(s) into {} record(s)",
            items_seen,
            parsed.inventory.len()
        );
        Ok(parsed)
    }
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn read_attributes(element: &BytesStart<'_>, builder: &mut ItemBuilder) -> Result<()> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| {
            SortError::malformed(InputFormat::Markup, builder.location(), e.to_string())
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        if let Some(field) = Field::from_name(&key) {
            let value = attr.unescape_value().map_err(|e| {
                SortError::malformed(InputFormat::Markup, builder.location(), e.to_string())
            })?;
            builder.set(field, &value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BRICKSTORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<BrickStoreXML>
  <Inventory>
    <Item>
      <ItemID>3001</ItemID>
      <ItemTypeID>P</ItemTypeID>
      <ColorID>5</ColorID>
      <ItemName>Brick 2 x 4</ItemName>
      <Qty>4</Qty>
    </Item>
    <Item>
      <ItemID>3023</ItemID>
      <ColorID>11</ColorID>
      <Qty>10</Qty>
      <Remarks>Tom &amp; Jerry</Remarks>
    </Item>
  </Inventory>
</BrickStoreXML>
"#;

    fn parse(text: &str) -> Result<ParsedInventory> {
        MarkupParser.parse(text.as_bytes())
    }

    #[test]
    fn test_parse_brickstore_children() {
        let parsed = parse(BRICKSTORE).unwrap();
        assert_eq!(
            parsed.inventory.records(),
            &[
                PartRecord::new("3001", "5", 4, InputFormat::Markup),
                PartRecord::new("3023", "11", 10, InputFormat::Markup),
            ]
        );
    }

    #[test]
    fn test_parse_attributes() {
        let parsed = parse(
            r#"<Inventory><Item ItemID="3001" ColorID="5" Qty="2"/><Item ItemID="3001" ColorID="5" Qty="1"></Item></Inventory>"#,
        )
        .unwrap();
        assert_eq!(parsed.inventory.len(), 1);
        assert_eq!(parsed.inventory.records()[0].quantity, 3);
    }

    #[test]
    fn test_parse_cdata_fields() {
        let parsed = parse(
            "<Inventory><Item><ItemID><![CDATA[3001]]></ItemID><ColorID>5</ColorID><Qty><![CDATA[2]]></Qty></Item></Inventory>",
        )
        .unwrap();
        assert_eq!(
            parsed.inventory.records(),
            &[PartRecord::new("3001", "5", 2, InputFormat::Markup)]
        );
    }

    #[test]
    fn test_missing_required_field() {
        let err = parse("<Inventory><Item><ItemID>3001</ItemID><Qty>1</Qty></Item></Inventory>")
            .unwrap_err();
        match err {
            SortError::MalformedInput {
                location, message, ..
            } => {
                assert_eq!(location, "item 1");
                assert!(message.contains("ColorID"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<Inventory><Item><ItemID>3001</ItemID>").unwrap_err();
        assert!(matches!(err, SortError::MalformedInput { .. }));
    }

    #[test]
    fn test_mismatched_element() {
        let err = parse("<Inventory><Item></Inventory>").unwrap_err();
        assert!(matches!(err, SortError::MalformedInput { .. }));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse("").is_err());
    }

    #[test]
    fn test_empty_inventory_is_not_malformed() {
        let parsed = parse("<BrickStoreXML><Inventory/></BrickStoreXML>").unwrap();
        assert!(parsed.inventory.is_empty());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let parsed = parse(r#"<Inventory><Item ItemID="3001" ColorID="5" Qty="0"/></Inventory>"#)
            .unwrap();
        assert!(parsed.inventory.is_empty());
        assert_eq!(parsed.warnings.len(), 1);
    }
}
