//! Rendering pipeline: region layout, paint commands, rasterization.
//!
//! The pipeline takes a region snapshot (serialized HTML plus the page base
//! URL), lays it out as a vertical stack of blocks, builds a display list,
//! and rasterizes it onto an opaque RGBA canvas encoded as PNG.

pub mod layout;
pub mod paint;
pub mod raster;

pub use raster::Rasterizer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque RGB color. Alpha is fixed at 255 by construction, so a
/// configured background can never reintroduce transparency into a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgba(&self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, 255)
    }
}

impl FromStr for Color {
    type Err = crate::Error;

    /// Parse `#rgb` or `#rrggbb` notation.
    fn from_str(s: &str) -> crate::Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let expand = |n: u8| n << 4 | n;
        match hex.len() {
            3 => {
                let v = u16::from_str_radix(hex, 16)
                    .map_err(|_| crate::Error::ConfigError(format!("Invalid color: {}", s)))?;
                Ok(Color::rgb(
                    expand(((v >> 8) & 0xf) as u8),
                    expand(((v >> 4) & 0xf) as u8),
                    expand((v & 0xf) as u8),
                ))
            }
            6 => {
                let v = u32::from_str_radix(hex, 16)
                    .map_err(|_| crate::Error::ConfigError(format!("Invalid color: {}", s)))?;
                Ok(Color::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8))
            }
            _ => Err(crate::Error::ConfigError(format!("Invalid color: {}", s))),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The capture region as taken at activation time: the region's serialized
/// HTML plus the base URL used to resolve its resource references. Lifetime
/// is one rasterization job.
#[derive(Debug, Clone)]
pub struct RegionSnapshot {
    pub html: String,
    pub base_url: Option<String>,
}

impl RegionSnapshot {
    pub fn new(html: impl Into<String>, base_url: Option<&str>) -> Self {
        Self {
            html: html.into(),
            base_url: base_url.map(|s| s.to_string()),
        }
    }
}

/// Options for one rasterization job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Layout width of the capture in pixels; output height is content-sized
    pub width: u32,
    /// Opaque background fill for areas no content covers
    pub background: Color,
    /// Whether cross-origin image resources may be fetched
    pub cross_origin: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width: 800,
            background: Color::WHITE,
            cross_origin: true,
        }
    }
}

/// A rendered capture: RGBA dimensions plus the PNG-encoded bytes
#[derive(Debug, Clone)]
pub struct Capture {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}
