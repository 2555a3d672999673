//! 8-bit RGBA colors parsed from text.
//!
//! Accepted forms, after trimming:
//!
//! - empty: transparent
//! - a known color name, case-insensitive, optionally quoted (`'Red'`)
//! - `#RRGGBB`, `0xRRGGBB`, `&hRRGGBB`: opaque
//! - comma-separated integers, each decimal or `#`/`0x`/`&h` hex:
//!   one packed ARGB value, `R,G,B` (opaque), or `A,R,G,B`
//!
//! List components keep only their low byte.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const LIST_SEPARATOR: char = ',';

/// Straight-alpha 8-bit RGBA color.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// White with zero alpha.
    pub const TRANSPARENT: Self = Self::from_argb(0x00FF_FFFF);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color from components.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from components.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack `0xAARRGGBB`.
    #[must_use]
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
            a: (argb >> 24) as u8,
        }
    }

    /// Pack as `0xAARRGGBB`.
    #[must_use]
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24
            | (self.r as u32) << 16
            | (self.g as u32) << 8
            | self.b as u32
    }

    /// Look up a known color name, ignoring ASCII case.
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("Transparent") {
            return Some(Self::TRANSPARENT);
        }
        NAMED_COLORS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|&(_, rgb)| Self::from_argb(0xFF00_0000 | rgb))
    }

    /// Normalized components for wgpu clears and blend constants.
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::Color {
        let unit = |c: u8| f64::from(c) / 255.0;
        wgpu::Color {
            r: unit(self.r),
            g: unit(self.g),
            b: unit(self.b),
            a: unit(self.a),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.to_argb())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_color(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl From<Color> for wgpu::Color {
    fn from(color: Color) -> Self {
        color.to_wgpu()
    }
}

/// Why a color string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// A quoted name that is not a known color.
    UnknownName(String),
    /// A component that is not a decimal or hex integer.
    InvalidNumber(String),
    /// A list with a component count other than 1, 3, or 4.
    ComponentCount(usize),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownName(name) => write!(f, "unknown color name '{name}'"),
            Self::InvalidNumber(token) => {
                write!(f, "invalid color component '{token}'")
            }
            Self::ComponentCount(n) => {
                write!(f, "expected 1, 3, or 4 color components, got {n}")
            }
        }
    }
}

impl std::error::Error for ColorParseError {}

/// Parse a color from text. See the module docs for accepted forms.
///
/// # Errors
///
/// Returns [`ColorParseError`] if `text` matches none of the forms.
pub fn parse_color(text: &str) -> Result<Color, ColorParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Color::TRANSPARENT);
    }
    if let Some(color) = Color::named(text) {
        return Ok(color);
    }

    if !text.contains(LIST_SEPARATOR) {
        if let Some(name) = unquote(text) {
            return Color::named(name)
                .ok_or_else(|| ColorParseError::UnknownName(name.to_owned()));
        }
        let short_hex = match text.len() {
            7 => text.starts_with('#'),
            8 => !text.starts_with('#') && hex_digits(text).is_some(),
            _ => false,
        };
        if short_hex {
            // Six digits carry no alpha; treat as opaque.
            return parse_int(text)
                .map(|rgb| Color::from_argb(0xFF00_0000 | rgb));
        }
    }

    let values = text
        .split(LIST_SEPARATOR)
        .map(parse_int)
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        &[argb] => Ok(Color::from_argb(argb)),
        &[r, g, b] => Ok(Color::rgb(low_byte(r), low_byte(g), low_byte(b))),
        &[a, r, g, b] => Ok(Color::rgba(
            low_byte(r),
            low_byte(g),
            low_byte(b),
            low_byte(a),
        )),
        _ => Err(ColorParseError::ComponentCount(values.len())),
    }
}

fn unquote(text: &str) -> Option<&str> {
    let first = text.chars().next()?;
    if text.len() < 2 || !(first == '\'' || first == '"') {
        return None;
    }
    text.strip_prefix(first)?.strip_suffix(first)
}

fn hex_digits(token: &str) -> Option<&str> {
    ["#", "0x", "0X", "&h", "&H"]
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))
}

fn parse_int(token: &str) -> Result<u32, ColorParseError> {
    let token = token.trim();
    let parsed = match hex_digits(token) {
        Some(digits) => u32::from_str_radix(digits, 16).ok(),
        // Negative decimals wrap to their two's-complement bits.
        None => token.parse::<i32>().ok().map(|v| v as u32),
    };
    parsed.ok_or_else(|| ColorParseError::InvalidNumber(token.to_owned()))
}

fn low_byte(value: u32) -> u8 {
    (value & 0xFF) as u8
}

/// Known opaque colors as `0xRRGGBB`.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("AliceBlue", 0xF0F8FF),
    ("AntiqueWhite", 0xFAEBD7),
    ("Aqua", 0x00FFFF),
    ("Aquamarine", 0x7FFFD4),
    ("Azure", 0xF0FFFF),
    ("Beige", 0xF5F5DC),
    ("Bisque", 0xFFE4C4),
    ("Black", 0x000000),
    ("BlanchedAlmond", 0xFFEBCD),
    ("Blue", 0x0000FF),
    ("BlueViolet", 0x8A2BE2),
    ("Brown", 0xA52A2A),
    ("BurlyWood", 0xDEB887),
    ("CadetBlue", 0x5F9EA0),
    ("Chartreuse", 0x7FFF00),
    ("Chocolate", 0xD2691E),
    ("Coral", 0xFF7F50),
    ("CornflowerBlue", 0x6495ED),
    ("Cornsilk", 0xFFF8DC),
    ("Crimson", 0xDC143C),
    ("Cyan", 0x00FFFF),
    ("DarkBlue", 0x00008B),
    ("DarkCyan", 0x008B8B),
    ("DarkGoldenrod", 0xB8860B),
    ("DarkGray", 0xA9A9A9),
    ("DarkGreen", 0x006400),
    ("DarkKhaki", 0xBDB76B),
    ("DarkMagenta", 0x8B008B),
    ("DarkOliveGreen", 0x556B2F),
    ("DarkOrange", 0xFF8C00),
    ("DarkOrchid", 0x9932CC),
    ("DarkRed", 0x8B0000),
    ("DarkSalmon", 0xE9967A),
    ("DarkSeaGreen", 0x8FBC8B),
    ("DarkSlateBlue", 0x483D8B),
    ("DarkSlateGray", 0x2F4F4F),
    ("DarkTurquoise", 0x00CED1),
    ("DarkViolet", 0x9400D3),
    ("DeepPink", 0xFF1493),
    ("DeepSkyBlue", 0x00BFFF),
    ("DimGray", 0x696969),
    ("DodgerBlue", 0x1E90FF),
    ("Firebrick", 0xB22222),
    ("FloralWhite", 0xFFFAF0),
    ("ForestGreen", 0x228B22),
    ("Fuchsia", 0xFF00FF),
    ("Gainsboro", 0xDCDCDC),
    ("GhostWhite", 0xF8F8FF),
    ("Gold", 0xFFD700),
    ("Goldenrod", 0xDAA520),
    ("Gray", 0x808080),
    ("Green", 0x008000),
    ("GreenYellow", 0xADFF2F),
    ("Honeydew", 0xF0FFF0),
    ("HotPink", 0xFF69B4),
    ("IndianRed", 0xCD5C5C),
    ("Indigo", 0x4B0082),
    ("Ivory", 0xFFFFF0),
    ("Khaki", 0xF0E68C),
    ("Lavender", 0xE6E6FA),
    ("LavenderBlush", 0xFFF0F5),
    ("LawnGreen", 0x7CFC00),
    ("LemonChiffon", 0xFFFACD),
    ("LightBlue", 0xADD8E6),
    ("LightCoral", 0xF08080),
    ("LightCyan", 0xE0FFFF),
    ("LightGoldenrodYellow", 0xFAFAD2),
    ("LightGray", 0xD3D3D3),
    ("LightGreen", 0x90EE90),
    ("LightPink", 0xFFB6C1),
    ("LightSalmon", 0xFFA07A),
    ("LightSeaGreen", 0x20B2AA),
    ("LightSkyBlue", 0x87CEFA),
    ("LightSlateGray", 0x778899),
    ("LightSteelBlue", 0xB0C4DE),
    ("LightYellow", 0xFFFFE0),
    ("Lime", 0x00FF00),
    ("LimeGreen", 0x32CD32),
    ("Linen", 0xFAF0E6),
    ("Magenta", 0xFF00FF),
    ("Maroon", 0x800000),
    ("MediumAquamarine", 0x66CDAA),
    ("MediumBlue", 0x0000CD),
    ("MediumOrchid", 0xBA55D3),
    ("MediumPurple", 0x9370DB),
    ("MediumSeaGreen", 0x3CB371),
    ("MediumSlateBlue", 0x7B68EE),
    ("MediumSpringGreen", 0x00FA9A),
    ("MediumTurquoise", 0x48D1CC),
    ("MediumVioletRed", 0xC71585),
    ("MidnightBlue", 0x191970),
    ("MintCream", 0xF5FFFA),
    ("MistyRose", 0xFFE4E1),
    ("Moccasin", 0xFFE4B5),
    ("NavajoWhite", 0xFFDEAD),
    ("Navy", 0x000080),
    ("OldLace", 0xFDF5E6),
    ("Olive", 0x808000),
    ("OliveDrab", 0x6B8E23),
    ("Orange", 0xFFA500),
    ("OrangeRed", 0xFF4500),
    ("Orchid", 0xDA70D6),
    ("PaleGoldenrod", 0xEEE8AA),
    ("PaleGreen", 0x98FB98),
    ("PaleTurquoise", 0xAFEEEE),
    ("PaleVioletRed", 0xDB7093),
    ("PapayaWhip", 0xFFEFD5),
    ("PeachPuff", 0xFFDAB9),
    ("Peru", 0xCD853F),
    ("Pink", 0xFFC0CB),
    ("Plum", 0xDDA0DD),
    ("PowderBlue", 0xB0E0E6),
    ("Purple", 0x800080),
    ("Red", 0xFF0000),
    ("RosyBrown", 0xBC8F8F),
    ("RoyalBlue", 0x4169E1),
    ("SaddleBrown", 0x8B4513),
    ("Salmon", 0xFA8072),
    ("SandyBrown", 0xF4A460),
    ("SeaGreen", 0x2E8B57),
    ("SeaShell", 0xFFF5EE),
    ("Sienna", 0xA0522D),
    ("Silver", 0xC0C0C0),
    ("SkyBlue", 0x87CEEB),
    ("SlateBlue", 0x6A5ACD),
    ("SlateGray", 0x708090),
    ("Snow", 0xFFFAFA),
    ("SpringGreen", 0x00FF7F),
    ("SteelBlue", 0x4682B4),
    ("Tan", 0xD2B48C),
    ("Teal", 0x008080),
    ("Thistle", 0xD8BFD8),
    ("Tomato", 0xFF6347),
    ("Turquoise", 0x40E0D0),
    ("Violet", 0xEE82EE),
    ("Wheat", 0xF5DEB3),
    ("White", 0xFFFFFF),
    ("WhiteSmoke", 0xF5F5F5),
    ("Yellow", 0xFFFF00),
    ("YellowGreen", 0x9ACD32),
];
