//! Visual configuration for particle rendering.
//!
//! These options control how particles look, separate from how they move.
//!
//! They are usually read from the `visuals` section of the config file:
//!
//! ```ignore
//! let visuals: VisualConfig = serde_json::from_str(r##"{"color": "#33CCFF", "point_size": 0.08}"##)?;
//! ```

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Preset particle colours, cycled by the colour shortcut.
pub const PALETTE: [Color; 6] = [
    Color::rgb8(0xFF, 0x33, 0x66),
    Color::rgb8(0x33, 0xCC, 0xFF),
    Color::rgb8(0xFF, 0xCC, 0x33),
    Color::rgb8(0x33, 0xFF, 0x99),
    Color::rgb8(0xCC, 0x33, 0xFF),
    Color::rgb8(0xFF, 0xFF, 0xFF),
];

/// An sRGB colour stored as 8-bit channels.
///
/// Serializes as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `RRGGBB` or the short `#RGB` form.
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| format!("invalid hex colour '{hex}'"));
        match digits.len() {
            6 if digits.is_ascii() => Ok(Self::rgb8(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 if digits.is_ascii() => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::rgb8(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(format!("invalid hex colour '{hex}'")),
        }
    }

    /// `#RRGGBB`, uppercase.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Channels in `[0, 1]`, still sRGB encoded.
    pub fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }

    /// Channels converted to linear light, for sRGB render targets.
    pub fn to_linear(&self) -> Vec3 {
        let v = self.to_vec3();
        Vec3::new(srgb_to_linear(v.x), srgb_to_linear(v.y), srgb_to_linear(v.z))
    }

    /// The palette entry after this one, or the first entry for a colour
    /// outside the palette.
    pub fn next_in_palette(&self) -> Color {
        match PALETTE.iter().position(|c| c == self) {
            Some(i) => PALETTE[(i + 1) % PALETTE.len()],
            None => PALETTE[0],
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl Default for Color {
    fn default() -> Self {
        PALETTE[0]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// Blend mode for particle rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Standard alpha blending.
    Alpha,

    /// Colours add up, so dense regions glow.
    #[default]
    Additive,
}

/// Configuration for particle visuals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Initial particle colour.
    pub color: Color,
    pub blend_mode: BlendMode,
    /// Edge length of each particle quad, in world units.
    pub point_size: f32,
    pub opacity: f32,
    /// Background clear colour.
    pub background: Color,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            color: PALETTE[0],
            blend_mode: BlendMode::Additive,
            point_size: 0.05,
            opacity: 0.8,
            background: Color::rgb8(0x05, 0x05, 0x05),
        }
    }
}
