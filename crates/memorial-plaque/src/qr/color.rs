//! Hex colors, contrast ratios and QR engraving palettes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::wizard::PlaqueColor;

/// An opaque sRGB color written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor([u8; 3]);

impl HexColor {
    /// Pure black.
    pub const BLACK: Self = Self([0x00, 0x00, 0x00]);
    /// Pure white.
    pub const WHITE: Self = Self([0xFF, 0xFF, 0xFF]);
    /// Dark gold used for gold engraving fill.
    pub const ENGRAVING_GOLD: Self = Self([0x8B, 0x69, 0x14]);
    /// Dark silver used for silver engraving fill.
    pub const ENGRAVING_SILVER: Self = Self([0x70, 0x70, 0x70]);

    /// Build a color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Red, green and blue channels.
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        self.0
    }

    /// WCAG relative luminance in `0.0..=1.0`.
    #[must_use]
    pub fn relative_luminance(self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let s = f64::from(channel) / 255.0;
            if s <= 0.039_28 {
                s / 12.92
            } else {
                ((s + 0.055) / 1.055).powf(2.4)
            }
        }
        let [r, g, b] = self.0;
        0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
    }
}

/// WCAG contrast ratio between two colors, from 1.0 to 21.0.
#[must_use]
pub fn contrast_ratio(a: HexColor, b: HexColor) -> f64 {
    let (la, lb) = (a.relative_luminance(), b.relative_luminance());
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

impl FromStr for HexColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for HexColor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

/// The two colors a QR code is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Module color.
    pub dark: HexColor,
    /// Background and quiet-zone color.
    pub light: HexColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark: HexColor::BLACK,
            light: HexColor::WHITE,
        }
    }
}

impl Palette {
    /// Palette for the QR color chosen on the plaque.
    ///
    /// The chosen color fills the modules on a white ground. White has no
    /// contrast against that ground, so a white choice is rendered black on
    /// white. Gold and silver use darkened engraving tones that keep the
    /// contrast above the scanning threshold.
    #[must_use]
    pub fn for_engraving(color: PlaqueColor) -> Self {
        let dark = match color {
            PlaqueColor::Gold => HexColor::ENGRAVING_GOLD,
            PlaqueColor::Silver => HexColor::ENGRAVING_SILVER,
            PlaqueColor::Black | PlaqueColor::White => HexColor::BLACK,
        };
        Self {
            dark,
            light: HexColor::WHITE,
        }
    }

    /// Contrast between the two colors.
    #[must_use]
    pub fn contrast(&self) -> f64 {
        contrast_ratio(self.dark, self.light)
    }
}
