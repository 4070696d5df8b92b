//! Field helpers shared by the format parsers.

use crate::error::{Result, SortError};

use super::InputFormat;

/// Decode a payload as UTF-8, dropping a leading byte order mark.
pub fn decode_text(raw: &[u8], format: InputFormat) -> Result<&str> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        SortError::malformed(
            format,
            format!("byte {}", e.valid_up_to()),
            "input is not valid UTF-8",
        )
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parse a key=value pair from a line.
pub fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();
    if key.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

/// Lowercase a column, attribute or element name and drop separators, so
/// `Part Num`, `part_num` and `PartNum` compare equal.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Outcome of reading a quantity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// A usable positive count.
    Accepted(u32),
    /// A well-formed count that is zero or negative.
    NonPositive(i64),
}

/// Read a quantity field. Non-integers are an error.
pub fn parse_quantity(value: &str) -> std::result::Result<Quantity, String> {
    let value = value.trim();
    let parsed: i64 = value
        .parse()
        .map_err(|_| format!("quantity '{}' is not an integer", value))?;
    if parsed <= 0 {
        return Ok(Quantity::NonPositive(parsed));
    }
    u32::try_from(parsed)
        .map(Quantity::Accepted)
        .map_err(|_| format!("quantity {} is too large", parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_bom() {
        let text = decode_text("\u{feff}Part".as_bytes(), InputFormat::Tabular).unwrap();
        assert_eq!(text, "Part");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = decode_text(&[b'a', 0xff, b'b'], InputFormat::Markup).unwrap_err();
        match err {
            SortError::MalformedInput { location, .. } => assert_eq!(location, "byte 1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("kind = basic"), Some(("kind", "basic")));
        assert_eq!(parse_key_value("caption="), Some(("caption", "")));
        assert_eq!(parse_key_value("=value"), None);
        assert_eq!(parse_key_value("no equals"), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Part Num"), "partnum");
        assert_eq!(normalize_name("color_id"), "colorid");
        assert_eq!(normalize_name("ItemID"), "itemid");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 12 "), Ok(Quantity::Accepted(12)));
        assert_eq!(parse_quantity("0"), Ok(Quantity::NonPositive(0)));
        assert_eq!(parse_quantity("-3"), Ok(Quantity::NonPositive(-3)));
        assert!(parse_quantity("two").is_err());
        assert!(parse_quantity("99999999999").is_err());
    }
}
