//! RGBA colors shared by the overlay text markup and debug shapes.
//!
//! Markup tags resolve against the named table first (`{red}`, `{grey}`),
//! then fall back to [`Color::parse`] for literal values (`{R=255,G=0,B=0}`
//! or `{#ff8000}`).

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const ORANGE: Color = Color::rgb(255, 127, 0);
    pub const GREY: Color = Color::rgb(192, 192, 192);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Look up a color by its lowercase name.
    pub fn from_name(name: &str) -> Option<Color> {
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, color)| *color)
    }

    /// Parse a literal color value.
    ///
    /// Accepts `R=..,G=..,B=..[,A=..]` (any order, alpha defaults to 255)
    /// and `#RRGGBB` / `#RRGGBBAA`.
    pub fn parse(text: &str) -> Option<Color> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let mut channels = [None::<u8>; 4];
        for part in text.split(',') {
            let (key, value) = part.split_once('=')?;
            let value: u8 = value.trim().parse().ok()?;
            let index = match key.trim() {
                "R" | "r" => 0,
                "G" | "g" => 1,
                "B" | "b" => 2,
                "A" | "a" => 3,
                _ => return None,
            };
            channels[index] = Some(value);
        }

        Some(Color {
            r: channels[0]?,
            g: channels[1]?,
            b: channels[2]?,
            a: channels[3].unwrap_or(255),
        })
    }

    fn parse_hex(hex: &str) -> Option<Color> {
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }
}

static NAMED_COLORS: &[(&str, Color)] = &[
    ("white", Color::WHITE),
    ("black", Color::BLACK),
    ("red", Color::RED),
    ("green", Color::GREEN),
    ("blue", Color::BLUE),
    ("yellow", Color::YELLOW),
    ("cyan", Color::CYAN),
    ("magenta", Color::MAGENTA),
    ("orange", Color::ORANGE),
    ("grey", Color::GREY),
    ("gray", Color::GREY),
    ("lightgrey", Color::rgb(168, 168, 168)),
    ("dimgrey", Color::rgb(84, 84, 84)),
    ("silver", Color::rgb(230, 232, 250)),
    ("brown", Color::rgb(166, 42, 42)),
    ("gold", Color::rgb(205, 127, 50)),
    ("pink", Color::rgb(188, 143, 143)),
    ("salmon", Color::rgb(111, 66, 66)),
    ("orangered", Color::rgb(255, 36, 0)),
    ("limegreen", Color::rgb(50, 205, 50)),
    ("forestgreen", Color::rgb(35, 142, 35)),
    ("skyblue", Color::rgb(50, 153, 204)),
    ("steelblue", Color::rgb(35, 107, 142)),
    ("navyblue", Color::rgb(35, 35, 142)),
    ("violet", Color::rgb(79, 47, 79)),
    ("turquoise", Color::rgb(173, 234, 234)),
    ("khaki", Color::rgb(159, 159, 95)),
    ("wheat", Color::rgb(216, 216, 191)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_lookup_is_lowercase() {
        assert_eq!(Color::from_name("red"), Some(Color::RED));
        assert_eq!(Color::from_name("grey"), Some(Color::GREY));
        assert_eq!(Color::from_name("Red"), None);
        assert_eq!(Color::from_name("nope"), None);
    }

    #[test]
    fn test_parse_channel_list() {
        assert_eq!(
            Color::parse("R=10,G=20,B=30"),
            Some(Color::rgba(10, 20, 30, 255))
        );
        assert_eq!(
            Color::parse("A=5,B=3,G=2,R=1"),
            Some(Color::rgba(1, 2, 3, 5))
        );
        assert_eq!(Color::parse("R=10,G=20"), None);
        assert_eq!(Color::parse("R=300,G=0,B=0"), None);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(
            Color::parse("#00000080"),
            Some(Color::rgba(0, 0, 0, 128))
        );
        assert_eq!(Color::parse("#fff"), None);
        assert_eq!(Color::parse("#zzzzzz"), None);
    }
}
