//! Minimal capture example: load an itinerary page, activate the capture
//! control, and print the written artifact.
//!
//! Run with: cargo run --example capture_page

use itincap::controller::CAPTURE_TRIGGER;
use itincap::{CaptureConfig, CaptureController, Page};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Lisbon Itinerary</title></head>
<body>
<button id="capture-btn">Save as image</button>
<section class="itinerary-section">
  <h2>Day 1: Lisbon</h2>
  <p>Morning walk through Alfama, pastel de nata tasting, sunset at the miradouro.</p>
  <ul><li>Tram 28</li><li>Castelo de S. Jorge</li></ul>
</section>
<button class="download-btn">Download PDF</button>
<button id="quick-pdf-btn">Quick PDF</button>
</body>
</html>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CaptureConfig {
        downloads_dir: std::env::temp_dir().join("itincap-demo"),
        ..Default::default()
    };

    let mut page = Page::new(&config)?;
    let controller = CaptureController::new(&config)?;
    controller.install(&mut page);

    page.load_html(PAGE, None);

    if page.click(CAPTURE_TRIGGER) {
        controller.rasterizer().flush();
    }

    for path in controller.downloads().completed() {
        println!("saved {}", path.display());
    }

    Ok(())
}
