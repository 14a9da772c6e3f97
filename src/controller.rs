//! `CaptureController`: binds the two page actions and executes them.
//!
//! The controller owns the rasterizer worker and the downloads sink. It
//! registers its bindings when the page's one-shot ready signal fires, and
//! at most once per controller. Both operations are stateless between
//! invocations.

use crate::download::{png_data_uri, DownloadLink, Downloads};
use crate::page::Page;
use crate::rendering::{RasterOptions, Rasterizer, RegionSnapshot};
use crate::{CaptureConfig, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Selector of the capture trigger control
pub const CAPTURE_TRIGGER: &str = "#capture-btn";
/// Selector of the capturable content region
pub const CAPTURE_REGION: &str = ".itinerary-section";
/// Selector of the PDF download control owned by an external collaborator
pub const PDF_TARGET: &str = ".download-btn";
/// Selector of the quick-PDF proxy control
pub const QUICK_PDF_TRIGGER: &str = "#quick-pdf-btn";

pub struct CaptureController {
    rasterizer: Arc<Rasterizer>,
    downloads: Arc<Downloads>,
    options: RasterOptions,
    filename: String,
    installed: AtomicBool,
}

impl CaptureController {
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        Ok(Self::with_parts(
            Arc::new(Rasterizer::new(config)),
            Arc::new(Downloads::new(&config.downloads_dir)?),
            config.raster_options(),
            config.filename.clone(),
        ))
    }

    /// Build a controller around an existing rasterizer and sink.
    pub fn with_parts(
        rasterizer: Arc<Rasterizer>,
        downloads: Arc<Downloads>,
        options: RasterOptions,
        filename: String,
    ) -> Self {
        Self {
            rasterizer,
            downloads,
            options,
            filename,
            installed: AtomicBool::new(false),
        }
    }

    pub fn rasterizer(&self) -> &Arc<Rasterizer> {
        &self.rasterizer
    }

    pub fn downloads(&self) -> &Arc<Downloads> {
        &self.downloads
    }

    /// Register both bindings once the page is ready. A second `install` on
    /// the same controller is ignored, as is a second ready signal.
    pub fn install(&self, page: &mut Page) {
        if self.installed.swap(true, Ordering::SeqCst) {
            log::debug!("capture controller already installed; ignoring");
            return;
        }
        let rasterizer = self.rasterizer.clone();
        let downloads = self.downloads.clone();
        let options = self.options.clone();
        let filename = self.filename.clone();
        page.on_ready(move |page| bind(page, rasterizer, downloads, options, filename));
    }
}

fn bind(
    page: &mut Page,
    rasterizer: Arc<Rasterizer>,
    downloads: Arc<Downloads>,
    options: RasterOptions,
    filename: String,
) {
    // Capture-to-image. The region is looked up at activation time, so a
    // region added or removed after binding is honored per click.
    page.on_click(CAPTURE_TRIGGER, move |ctx| {
        let region_html = match ctx.outer_html(CAPTURE_REGION) {
            Some(html) => html,
            None => {
                log::debug!("no {} region on page; capture skipped", CAPTURE_REGION);
                return;
            }
        };
        let region = RegionSnapshot::new(region_html, ctx.base_url());
        let downloads = downloads.clone();
        let filename = filename.clone();
        rasterizer.submit(region, options.clone(), move |result| match result {
            Ok(capture) => {
                let link = DownloadLink::new(filename, png_data_uri(&capture.png_data));
                if let Err(e) = link.click(&downloads) {
                    log::debug!("capture download failed: {}", e);
                }
            }
            // No observer on the error arm: a failed capture produces no
            // artifact and no user-visible feedback.
            Err(e) => log::debug!("capture render failed: {}", e),
        });
    });

    // PDF-trigger proxy. Both controls must exist at bind time; otherwise
    // the binding is skipped entirely.
    if page.find(QUICK_PDF_TRIGGER).is_some() && page.find(PDF_TARGET).is_some() {
        page.on_click(QUICK_PDF_TRIGGER, |ctx| {
            ctx.click(PDF_TARGET);
        });
    }
}
