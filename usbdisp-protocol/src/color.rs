//! Packed 16-bit display colors
//!
//! The display stores one `u16` per pixel, little-endian on the wire:
//!
//! ```text
//!  15        11 10          5 4         0
//! ┌────────────┬─────────────┬───────────┐
//! │ blue (5)   │ green (6)   │ red (5)   │
//! └────────────┴─────────────┴───────────┘
//! ```
//!
//! Channel values are never rejected; anything above a field's maximum
//! saturates at that maximum.

use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest value of the 5-bit red field
pub const MAX_RED: u32 = 0x1f;

/// Largest value of the 6-bit green field
pub const MAX_GREEN: u32 = 0x3f;

/// Largest value of the 5-bit blue field
pub const MAX_BLUE: u32 = 0x1f;

const GREEN_SHIFT: u32 = 5;
const BLUE_SHIFT: u32 = 11;

/// A packed display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Color(u16);

impl Color {
    /// All channels off
    pub const BLACK: Self = Self(0x0000);

    /// All channels saturated
    pub const WHITE: Self = Self(0xffff);

    /// Wrap an already packed value
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Pack a 5-6-5 color, saturating each channel
    pub fn rgb565(r: u32, g: u32, b: u32) -> Self {
        let r = r.min(MAX_RED);
        let g = g.min(MAX_GREEN);
        let b = b.min(MAX_BLUE);
        Self((r | (g << GREEN_SHIFT) | (b << BLUE_SHIFT)) as u16)
    }

    /// Pack a 5-5-5 color
    ///
    /// Green arrives on the same 0..=0x1f scale as red and blue and is
    /// doubled into the 6-bit field, so the lowest green bit is always 0.
    pub fn rgb555(r: u32, g: u32, b: u32) -> Self {
        Self::rgb565(r, g.saturating_mul(2), b)
    }

    /// Quantize full-range 8-bit channels
    pub fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        Self::rgb565(u32::from(r >> 3), u32::from(g >> 2), u32::from(b >> 3))
    }

    /// Get the packed value
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Wire representation
    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    /// Parse the wire representation
    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }

    /// Red channel (0..=0x1f)
    pub const fn red(self) -> u8 {
        (self.0 & 0x1f) as u8
    }

    /// Green channel (0..=0x3f)
    pub const fn green(self) -> u8 {
        ((self.0 >> GREEN_SHIFT) & 0x3f) as u8
    }

    /// Blue channel (0..=0x1f)
    pub const fn blue(self) -> u8 {
        ((self.0 >> BLUE_SHIFT) & 0x1f) as u8
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        color.raw()
    }
}

/// How raw channel values supplied by a caller are quantized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColorMode {
    /// Red and blue 0..=0x1f, green 0..=0x3f
    Rgb565,
    /// All channels 0..=0x1f
    #[default]
    Rgb555,
}

impl ColorMode {
    /// Pack channels using this mode
    pub fn pack(self, r: u32, g: u32, b: u32) -> Color {
        match self {
            ColorMode::Rgb565 => Color::rgb565(r, g, b),
            ColorMode::Rgb555 => Color::rgb555(r, g, b),
        }
    }
}

/// Error returned when parsing a [`ColorMode`] name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownColorMode;

impl core::fmt::Display for UnknownColorMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("expected 565 or 555")
    }
}

impl FromStr for ColorMode {
    type Err = UnknownColorMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "565" | "rgb565" => Ok(ColorMode::Rgb565),
            "555" | "rgb555" => Ok(ColorMode::Rgb555),
            _ => Err(UnknownColorMode),
        }
    }
}
