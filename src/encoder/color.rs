//! Color palette used to turn color codes into a numeric signal.
//!
//! Color ids are arbitrary codes, so their ordinal value carries no meaning.
//! The encoder works on sRGB channels instead.

use crate::parser::fields::normalize_name;

/// Rebrickable / LDraw color id, name and sRGB value.
const PALETTE: &[(u16, &str, u32)] = &[
    (0, "Black", 0x05131D),
    (1, "Blue", 0x0055BF),
    (2, "Green", 0x237841),
    (3, "Dark Turquoise", 0x008F9B),
    (4, "Red", 0xC91A09),
    (5, "Dark Pink", 0xC870A0),
    (6, "Brown", 0x583927),
    (7, "Light Gray", 0x9BA19D),
    (8, "Dark Gray", 0x6D6E5C),
    (9, "Light Blue", 0xB4D2E3),
    (10, "Bright Green", 0x4B9F4A),
    (11, "Light Turquoise", 0x55A5AF),
    (12, "Salmon", 0xF2705E),
    (13, "Pink", 0xFC97AC),
    (14, "Yellow", 0xF2CD37),
    (15, "White", 0xFFFFFF),
    (17, "Light Green", 0xC2DAB8),
    (18, "Light Yellow", 0xFBE696),
    (19, "Tan", 0xE4CD9E),
    (22, "Purple", 0x81007B),
    (25, "Orange", 0xFE8A18),
    (26, "Magenta", 0x923978),
    (27, "Lime", 0xBBE90B),
    (28, "Dark Tan", 0x958A73),
    (29, "Bright Pink", 0xE4ADC8),
    (33, "Trans-Dark Blue", 0x0020A0),
    (34, "Trans-Green", 0x84B68D),
    (36, "Trans-Red", 0xC91A09),
    (40, "Trans-Black", 0x635F52),
    (41, "Trans-Light Blue", 0xAEEFEC),
    (46, "Trans-Yellow", 0xF5CD2F),
    (47, "Trans-Clear", 0xFCFCFC),
    (70, "Reddish Brown", 0x582A12),
    (71, "Light Bluish Gray", 0xA0A5A9),
    (72, "Dark Bluish Gray", 0x6C6E68),
    (73, "Medium Blue", 0x5A93DB),
    (84, "Medium Nougat", 0xAA7D55),
    (85, "Dark Purple", 0x3F3691),
    (191, "Bright Light Orange", 0xF8BB3D),
    (226, "Bright Light Yellow", 0xFFF03A),
    (272, "Dark Blue", 0x0A3463),
    (288, "Dark Green", 0x184632),
    (308, "Dark Brown", 0x352100),
    (320, "Dark Red", 0x720E0F),
    (326, "Yellowish Green", 0xDFEEA5),
    (378, "Sand Green", 0xA0BCAC),
    (379, "Sand Blue", 0x6074A1),
    (484, "Dark Orange", 0xA95500),
];

/// Value used for colors outside the palette.
const NEUTRAL: u32 = 0x808080;

/// sRGB of a color id or name.
pub fn lookup(color: &str) -> Option<u32> {
    let color = color.trim();
    if let Ok(id) = color.parse::<u16>() {
        return PALETTE.iter().find(|(i, _, _)| *i == id).map(|(_, _, rgb)| *rgb);
    }
    let wanted = normalize_name(color);
    PALETTE
        .iter()
        .find(|(_, name, _)| normalize_name(name) == wanted)
        .map(|(_, _, rgb)| *rgb)
}

/// Color channels scaled to [0, 1]; unknown colors map to mid gray.
pub fn channels(color: &str) -> [f64; 3] {
    let rgb = lookup(color).unwrap_or(NEUTRAL);
    [
        f64::from((rgb >> 16) & 0xFF) / 255.0,
        f64::from((rgb >> 8) & 0xFF) / 255.0,
        f64::from(rgb & 0xFF) / 255.0,
    ]
}
