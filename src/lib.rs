//! Itinerary page capture toolkit
//!
//! A headless utility that binds two independent actions to elements of a
//! loaded itinerary page and executes them with browser-equivalent
//! semantics:
//!
//! - **Capture-to-image**: rasterize the first `.itinerary-section` region
//!   to an opaque PNG and deliver it through a downloads sink as
//!   `itinerary_capture.png`.
//! - **PDF-trigger proxy**: forward an activation of `#quick-pdf-btn` to
//!   the first `.download-btn` element, delegating to whatever handler an
//!   external collaborator bound there.
//!
//! # Example
//!
//! ```no_run
//! use itincap::{CaptureConfig, CaptureController, Page};
//!
//! # fn main() -> itincap::Result<()> {
//! let config = CaptureConfig {
//!     downloads_dir: "downloads".into(),
//!     ..Default::default()
//! };
//!
//! let mut page = Page::new(&config)?;
//! let controller = CaptureController::new(&config)?;
//! controller.install(&mut page);
//!
//! page.load_url("http://localhost:5000/itinerary")?;
//! page.click("#capture-btn");
//! controller.rasterizer().flush();
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod page;

pub mod controller;

pub mod rendering;

// Image loading for the rasterizer (network fetching behind `remote`)
pub mod resources;

pub mod download;

// Async-friendly capture API (worker-backed abstraction)
pub mod session;

pub use controller::CaptureController;
pub use download::{DownloadLink, Downloads};
pub use page::Page;
pub use rendering::{Capture, Color, RasterOptions, Rasterizer, RegionSnapshot};
pub use session::Session;

/// Configuration for the capture toolkit
///
/// The defaults match the capture control's contract: an opaque white
/// background fill and cross-origin image loading enabled, with the
/// artifact named `itinerary_capture.png`.
///
/// # Examples
///
/// ```
/// let cfg = itincap::CaptureConfig::default();
/// assert_eq!(cfg.filename, "itinerary_capture.png");
/// assert!(cfg.cross_origin);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// User agent string to send with page and resource requests
    pub user_agent: String,
    /// Timeout for page loads and resource fetches in milliseconds
    pub timeout_ms: u64,
    /// Layout width for captured regions, in pixels
    pub page_width: u32,
    /// Background fill for transparent areas of the capture
    pub background: Color,
    /// Whether the rasterizer may fetch cross-origin image resources
    pub cross_origin: bool,
    /// Directory the downloads sink writes artifacts into
    pub downloads_dir: PathBuf,
    /// Filename of the capture artifact
    pub filename: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/115.0 ItinCap/0.1"
                .to_string(),
            timeout_ms: 30000,
            page_width: 800,
            background: Color::WHITE,
            cross_origin: true,
            downloads_dir: PathBuf::from("downloads"),
            filename: "itinerary_capture.png".to_string(),
        }
    }
}

impl CaptureConfig {
    /// Raster options derived from this configuration
    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            width: self.page_width,
            background: self.background,
            cross_origin: self.cross_origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.page_width, 800);
        assert_eq!(config.background, Color::WHITE);
        assert!(config.cross_origin);
        assert_eq!(config.filename, "itinerary_capture.png");
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = CaptureConfig {
            page_width: 640,
            cross_origin: false,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).expect("serialize config");
        let back: CaptureConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(back.page_width, 640);
        assert!(!back.cross_origin);
    }
}
