use anyhow::{bail, Context, Result};
use clap::Parser;
use itincap::controller::CAPTURE_TRIGGER;
use itincap::{CaptureConfig, CaptureController, Color, Page};
use serde::Serialize;
use std::path::PathBuf;

/// Load an itinerary page, activate its capture control, and write the
/// resulting PNG artifact into the downloads directory.
#[derive(Parser)]
#[command(name = "itincap", version, about = "Capture an itinerary page region to PNG")]
struct Args {
    /// Page URL to load (requires the `remote` feature)
    #[arg(long, conflicts_with = "input")]
    url: Option<String>,

    /// Local HTML file to load instead of a URL
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory downloads are written into
    #[arg(long, default_value = "downloads")]
    out: PathBuf,

    /// Layout width of the capture in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Background fill in #rrggbb notation
    #[arg(long, default_value = "#ffffff")]
    background: String,

    /// Disable cross-origin image fetching
    #[arg(long)]
    no_cors: bool,

    /// Artifact filename
    #[arg(long, default_value = "itinerary_capture.png")]
    filename: String,

    /// Emit the capture report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    captured: bool,
    artifacts: Vec<Artifact>,
}

#[derive(Serialize)]
struct Artifact {
    path: PathBuf,
    bytes: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let background: Color = args
        .background
        .parse()
        .with_context(|| format!("invalid --background {}", args.background))?;

    let config = CaptureConfig {
        page_width: args.width,
        background,
        cross_origin: !args.no_cors,
        downloads_dir: args.out.clone(),
        filename: args.filename.clone(),
        ..Default::default()
    };

    let mut page = Page::new(&config)?;
    let controller = CaptureController::new(&config)?;
    controller.install(&mut page);

    if let Some(url) = &args.url {
        #[cfg(feature = "remote")]
        page.load_url(url)?;

        #[cfg(not(feature = "remote"))]
        {
            let _ = url;
            bail!("--url requires a build with the `remote` feature");
        }
    } else if let Some(input) = &args.input {
        let html = std::fs::read_to_string(input)
            .with_context(|| format!("cannot read {}", input.display()))?;
        page.load_html(&html, None);
    } else {
        bail!("one of --url or --input is required");
    }

    page.click(CAPTURE_TRIGGER);
    controller.rasterizer().flush();

    let mut artifacts = Vec::new();
    for path in controller.downloads().completed() {
        let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        artifacts.push(Artifact { path, bytes });
    }
    let report = Report {
        captured: !artifacts.is_empty(),
        artifacts,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.captured {
        for artifact in &report.artifacts {
            println!("saved {} ({} bytes)", artifact.path.display(), artifact.bytes);
        }
    } else {
        // Missing trigger or region is a defined no-op, not an error.
        println!("nothing captured");
    }

    Ok(())
}
