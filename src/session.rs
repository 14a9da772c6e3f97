//! Async-friendly capture session (worker-backed abstraction).
//!
//! The worker thread owns a synchronous `Page` and `CaptureController` and
//! executes commands sent from async tasks, so callers get an async
//! interface without the page needing to move across threads.

use crate::controller::CAPTURE_TRIGGER;
use crate::{CaptureConfig, CaptureController, Error, Page, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    #[cfg(feature = "remote")]
    Goto(String, oneshot::Sender<Result<()>>),
    LoadHtml(String, Option<String>, oneshot::Sender<Result<()>>),
    Click(String, oneshot::Sender<Result<bool>>),
    Capture(oneshot::Sender<Result<Option<PathBuf>>>),
    Flush(oneshot::Sender<Result<()>>),
    Completed(oneshot::Sender<Result<Vec<PathBuf>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async handle to a page with an installed capture controller.
#[derive(Clone)]
pub struct Session {
    cmd_tx: Sender<Command>,
}

impl Session {
    /// Create a new session (spawns a worker thread that owns the page).
    pub async fn new(config: Option<CaptureConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize page and controller on the worker thread
            let mut page = match Page::new(&config) {
                Ok(p) => p,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let controller = match CaptureController::new(&config) {
                Ok(c) => c,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            controller.install(&mut page);

            let _ = init_tx.send(Ok(()));

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    #[cfg(feature = "remote")]
                    Command::Goto(url, resp) => {
                        let _ = resp.send(page.load_url(&url));
                    }
                    Command::LoadHtml(html, base_url, resp) => {
                        page.load_html(&html, base_url.as_deref());
                        let _ = resp.send(Ok(()));
                    }
                    Command::Click(selector, resp) => {
                        let _ = resp.send(Ok(page.click(&selector)));
                    }
                    Command::Capture(resp) => {
                        let before = controller.downloads().completed().len();
                        page.click(CAPTURE_TRIGGER);
                        controller.rasterizer().flush();
                        let completed = controller.downloads().completed();
                        let newest = if completed.len() > before {
                            completed.last().cloned()
                        } else {
                            None
                        };
                        let _ = resp.send(Ok(newest));
                    }
                    Command::Flush(resp) => {
                        controller.rasterizer().flush();
                        let _ = resp.send(Ok(()));
                    }
                    Command::Completed(resp) => {
                        let _ = resp.send(Ok(controller.downloads().completed()));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(
        &self,
        cmd: Command,
        rx: oneshot::Receiver<Result<T>>,
        what: &str,
    ) -> Result<T> {
        let _ = self.cmd_tx.send(cmd);
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))?
    }

    /// Fetch a document over HTTP and load it into the page.
    #[cfg(feature = "remote")]
    pub async fn goto(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Goto(url.to_string(), tx), rx, "Goto").await
    }

    /// Load a document from an HTML string.
    pub async fn load_html(&self, html: &str, base_url: Option<&str>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(
            Command::LoadHtml(html.to_string(), base_url.map(|s| s.to_string()), tx),
            rx,
            "LoadHtml",
        )
        .await
    }

    /// Activate the first element matching `selector`; `false` when absent.
    pub async fn click(&self, selector: &str) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Click(selector.to_string(), tx), rx, "Click")
            .await
    }

    /// Convenience: activate the capture trigger, wait for the rasterizer,
    /// and return the newly written artifact, if the capture produced one.
    pub async fn capture(&self) -> Result<Option<PathBuf>> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Capture(tx), rx, "Capture").await
    }

    /// Block the worker until queued capture jobs have completed.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Flush(tx), rx, "Flush").await
    }

    /// Paths of every completed download, in completion order.
    pub async fn completed_downloads(&self) -> Result<Vec<PathBuf>> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Completed(tx), rx, "Completed").await
    }

    /// Shut down the worker thread.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Close(tx), rx, "Close").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <button id="capture-btn">Capture</button>
        <section class="itinerary-section"><p>Day 1</p></section>
    </body></html>"#;

    fn test_config(tag: &str) -> CaptureConfig {
        let dir = std::env::temp_dir().join(format!("itincap-ses-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        CaptureConfig {
            downloads_dir: dir,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn session_captures_through_the_async_facade() {
        let session = Session::new(Some(test_config("basic"))).await.expect("session");
        session.load_html(PAGE, None).await.expect("load");

        let artifact = session.capture().await.expect("capture");
        let path = artifact.expect("artifact written");
        assert_eq!(path.file_name().unwrap(), "itinerary_capture.png");
        assert_eq!(session.completed_downloads().await.unwrap().len(), 1);

        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn session_capture_without_region_yields_nothing() {
        let session = Session::new(Some(test_config("noregion"))).await.expect("session");
        session
            .load_html("<html><body><button id='capture-btn'>C</button></body></html>", None)
            .await
            .expect("load");

        assert!(session.capture().await.expect("capture").is_none());
        assert!(session.completed_downloads().await.unwrap().is_empty());
        session.close().await.expect("close");
    }
}
