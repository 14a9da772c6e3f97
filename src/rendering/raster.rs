//! Rasterizer: opaque RGBA canvas, display-list execution, PNG encoding,
//! and the worker-thread service that runs capture jobs off the event loop.
//!
//! Text is greeked: each word paints as a bar covering its glyph cells.
//! That is enough for captures whose fidelity target is "recognizable
//! block rendering", and it keeps the rasterizer deterministic.

use crate::rendering::layout::layout_region;
use crate::rendering::paint::{build_display_list, PaintCommand};
use crate::rendering::{Capture, Color, RasterOptions, RegionSnapshot};
use crate::resources::{ImageLoader, ImagePixels};
use crate::{CaptureConfig, Error, Result};
use scraper::Html;
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    // Every pixel starts fully opaque in the background color; no later
    // operation may lower alpha.
    fn new(width: u32, height: u32, background: Color) -> Self {
        let (r, g, b, a) = background.rgba();
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[r, g, b, a]);
        }
        Self { width, height, data }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, rgba: (u8, u8, u8, u8)) {
        for py in y.max(0)..(y + h as i32).min(self.height as i32) {
            for px in x.max(0)..(x + w as i32).min(self.width as i32) {
                let off = ((py as u32 * self.width + px as u32) * 4) as usize;
                self.data[off] = rgba.0;
                self.data[off + 1] = rgba.1;
                self.data[off + 2] = rgba.2;
                self.data[off + 3] = 255;
            }
        }
    }

    // Nearest-neighbor scale into the target rect, alpha-compositing onto
    // the opaque canvas so transparent source pixels keep the background.
    fn blit_scaled(&mut self, x: i32, y: i32, w: u32, h: u32, pixels: &ImagePixels) {
        if pixels.width == 0 || pixels.height == 0 || w == 0 || h == 0 {
            return;
        }
        for dy in 0..h {
            let py = y + dy as i32;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            let sy = (dy as u64 * pixels.height as u64 / h as u64) as u32;
            for dx in 0..w {
                let px = x + dx as i32;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }
                let sx = (dx as u64 * pixels.width as u64 / w as u64) as u32;
                let src = ((sy * pixels.width + sx) * 4) as usize;
                let dst = ((py as u32 * self.width + px as u32) * 4) as usize;
                let alpha = pixels.data[src + 3] as u32;
                for c in 0..3 {
                    let s = pixels.data[src + c] as u32;
                    let d = self.data[dst + c] as u32;
                    self.data[dst + c] = ((s * alpha + d * (255 - alpha)) / 255) as u8;
                }
                self.data[dst + 3] = 255;
            }
        }
    }
}

fn draw_text_run(canvas: &mut Canvas, x: i32, y: i32, text: &str, scale: u32, rgba: (u8, u8, u8, u8)) {
    let cell = (8 * scale) as i32;
    for (li, line) in text.lines().enumerate() {
        let ty = y + li as i32 * cell;
        let mut cx = x;
        for word in line.split(' ') {
            let chars = word.chars().count() as i32;
            if chars > 0 {
                let bar_w = (chars * cell - 2).max(1) as u32;
                canvas.fill_rect(cx, ty + scale as i32, bar_w, 6 * scale, rgba);
            }
            cx += (chars + 1) * cell;
        }
    }
}

fn execute(canvas: &mut Canvas, commands: &[PaintCommand]) {
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                canvas.fill_rect(*x, *y, *width, *height, *rgba);
            }
            PaintCommand::TextRun { x, y, text, scale, rgba } => {
                draw_text_run(canvas, *x, *y, text, *scale, *rgba);
            }
            PaintCommand::Blit { x, y, width, height, pixels } => {
                canvas.blit_scaled(*x, *y, *width, *height, pixels);
            }
        }
    }
}

fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| Error::EncodeError(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| Error::EncodeError(format!("PNG data: {}", e)))?;
    }
    Ok(out)
}

/// Render one region snapshot to a PNG capture.
///
/// This is the synchronous core the worker runs; it is public so callers
/// (and benches) can rasterize without going through a worker.
pub fn render_region(
    region: &RegionSnapshot,
    options: &RasterOptions,
    loader: &ImageLoader,
) -> Result<Capture> {
    if options.width == 0 {
        return Err(Error::RenderError("capture width must be nonzero".into()));
    }

    let doc = Html::parse_fragment(&region.html);
    let (nodes, height) = layout_region(&doc, options.width);

    let mut images: HashMap<usize, ImagePixels> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        if let Some(src) = &node.src {
            if let Some(px) = loader.load(src, region.base_url.as_deref(), options.cross_origin) {
                images.insert(idx, px);
            }
        }
    }

    let commands = build_display_list(&nodes, &images);
    let mut canvas = Canvas::new(options.width, height, options.background);
    execute(&mut canvas, &commands);

    let png_data = encode_png(canvas.width, canvas.height, &canvas.data)?;
    Ok(Capture {
        width: canvas.width,
        height: canvas.height,
        png_data,
    })
}

enum Job {
    Render {
        region: RegionSnapshot,
        options: RasterOptions,
        done: Box<dyn FnOnce(Result<Capture>) + Send>,
    },
    Flush(mpsc::Sender<()>),
}

/// Worker-thread rasterization service.
///
/// Jobs queue in submission order and run one at a time on a dedicated
/// thread, so the submitting event loop stays free while a capture is in
/// flight. Overlapping submissions are independent; there is no debouncing
/// and no cancellation.
pub struct Rasterizer {
    tx: Option<mpsc::Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Rasterizer {
    pub fn new(config: &CaptureConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let user_agent = config.user_agent.clone();
        let timeout_ms = config.timeout_ms;
        let handle = thread::spawn(move || {
            let loader = ImageLoader::new(&user_agent, timeout_ms);
            while let Ok(job) = rx.recv() {
                match job {
                    Job::Render { region, options, done } => {
                        done(render_region(&region, &options, &loader));
                    }
                    Job::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Queue a capture job. Returns immediately; the worker invokes `done`
    /// with the deferred result. Whether anything observes the error arm is
    /// up to the caller.
    pub fn submit<F>(&self, region: RegionSnapshot, options: RasterOptions, done: F)
    where
        F: FnOnce(Result<Capture>) + Send + 'static,
    {
        let job = Job::Render {
            region,
            options,
            done: Box::new(done),
        };
        let tx = match &self.tx {
            Some(tx) => tx,
            None => return,
        };
        if let Err(mpsc::SendError(job)) = tx.send(job) {
            if let Job::Render { done, .. } = job {
                done(Err(Error::RenderError("rasterizer worker is gone".into())));
            }
        }
    }

    /// Block until every previously queued job has completed. Jobs run in
    /// FIFO order, so an acknowledged marker implies the queue ahead of it
    /// has drained.
    pub fn flush(&self) {
        if let Some(tx) = &self.tx {
            let (ack_tx, ack_rx) = mpsc::channel();
            if tx.send(Job::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.recv();
            }
        }
    }
}

impl Drop for Rasterizer {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
