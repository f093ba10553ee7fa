//! RGB color handling with hex parsing and serialization.

// Allow small types passed by reference for API consistency
#![allow(clippy::trivially_copy_pass_by_ref)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color value with hex string representation.
///
/// Markdown tables write colors as `#RRGGBB`; preset JSON stores them as bare
/// `RRGGBB`, which is also the serde representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Color {
    /// Creates a new `Color` from individual channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a `Color` from a hex string.
    ///
    /// Supports formats: "#RRGGBB", "RRGGBB", "#rrggbb", "rrggbb"
    ///
    /// # Examples
    ///
    /// ```
    /// use md2preset::models::Color;
    ///
    /// let color = Color::from_hex("#F45C51").unwrap();
    /// assert_eq!(color, Color::new(0xF4, 0x5C, 0x51));
    ///
    /// let color = Color::from_hex("00ff00").unwrap();
    /// assert_eq!(color, Color::new(0, 255, 0));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid hex color format.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid hex color format '{hex}'. Expected 6 hex digits (RRGGBB)");
        }

        let r = u8::from_str_radix(&hex[0..2], 16)
            .context(format!("Invalid red channel in hex color '{hex}'"))?;
        let g = u8::from_str_radix(&hex[2..4], 16)
            .context(format!("Invalid green channel in hex color '{hex}'"))?;
        let b = u8::from_str_radix(&hex[4..6], 16)
            .context(format!("Invalid blue channel in hex color '{hex}'"))?;

        Ok(Self::new(r, g, b))
    }

    /// Converts the color to a Markdown cell value, `#RRGGBB` (uppercase).
    ///
    /// # Examples
    ///
    /// ```
    /// use md2preset::models::Color;
    ///
    /// assert_eq!(Color::new(255, 0, 0).to_hex(), "#FF0000");
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{}", self.to_bare_hex())
    }

    /// Converts the color to the preset JSON form, `RRGGBB` (uppercase).
    #[must_use]
    pub fn to_bare_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_bare_hex()
    }
}
