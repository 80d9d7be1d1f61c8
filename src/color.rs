//! sRGB colors for page backgrounds and grid lines.
//!
//! Form layers hand colors over as strings (`#ffffff` from a color picker,
//! `lightgray` from a config file), so [`Color`] implements [`FromStr`]
//! for hex notation and a small table of CSS named colors.

use core::fmt;
use core::str::FromStr;

/// An sRGB color with alpha, 8 bits per channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Opaque white. Default page background.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Default grid line color.
    pub const LIGHT_GRAY: Self = Self::rgb(211, 211, 211);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex (`#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, `#` optional)
    /// or CSS named color. Names are case-insensitive.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorParseError::Empty);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if let Some(c) = parse_hex(hex) {
            return Ok(c);
        }
        lookup_named(s).ok_or(ColorParseError::Unrecognized)
    }

    /// Channels as `0.0..=1.0` floats, alpha dropped. PDF fill/stroke operands.
    pub fn unit_rgb(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// True when the color paints nothing.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `#rrggbb`, or `#rrggbbaa` when not opaque.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Why a color string was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    /// Input was empty or whitespace.
    #[error("empty color string")]
    Empty,
    /// Neither valid hex nor a known color name.
    #[error("unrecognized color")]
    Unrecognized,
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digits = hex.as_bytes();
    match digits.len() {
        3 | 4 => {
            let mut channels = [255u8; 4];
            for (slot, &d) in channels.iter_mut().zip(digits) {
                let n = nibble(d)?;
                *slot = n << 4 | n;
            }
            let [r, g, b, a] = channels;
            Some(Color::rgba(r, g, b, a))
        }
        6 | 8 => {
            let mut channels = [255u8; 4];
            for (slot, pair) in channels.iter_mut().zip(digits.chunks_exact(2)) {
                *slot = nibble(pair[0])? << 4 | nibble(pair[1])?;
            }
            let [r, g, b, a] = channels;
            Some(Color::rgba(r, g, b, a))
        }
        _ => None,
    }
}

fn nibble(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

fn lookup_named(name: &str) -> Option<Color> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, [r, g, b, a])| Color::rgba(r, g, b, a))
}

/// Named colors a paper form is likely to offer.
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("beige", [245, 245, 220, 255]),
    ("black", [0, 0, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("cream", [255, 253, 208, 255]),
    ("darkgray", [169, 169, 169, 255]),
    ("darkgrey", [169, 169, 169, 255]),
    ("gray", [128, 128, 128, 255]),
    ("green", [0, 128, 0, 255]),
    ("grey", [128, 128, 128, 255]),
    ("ivory", [255, 255, 240, 255]),
    ("lightblue", [173, 216, 230, 255]),
    ("lightgray", [211, 211, 211, 255]),
    ("lightgrey", [211, 211, 211, 255]),
    ("navy", [0, 0, 128, 255]),
    ("pink", [255, 192, 203, 255]),
    ("red", [255, 0, 0, 255]),
    ("silver", [192, 192, 192, 255]),
    ("transparent", [0, 0, 0, 0]),
    ("white", [255, 255, 255, 255]),
    ("whitesmoke", [245, 245, 245, 255]),
    ("yellow", [255, 255, 0, 255]),
];
