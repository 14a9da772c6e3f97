//! Headless page model: loaded document, element lookup, synthetic clicks.
//!
//! The document is kept as its source string and re-parsed per lookup, so
//! the page stays `Send` and element handles remain valid across calls.
//! Synthetic clicks go through a FIFO queue pumped on the caller's thread,
//! matching the cooperative single-threaded dispatch of a browser UI loop.
//! Handlers may enqueue further clicks through their [`EventCtx`]; they are
//! dispatched after the current handler returns.

use crate::{CaptureConfig, Result};
#[cfg(feature = "remote")]
use crate::Error;
use scraper::{Html, Selector};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[cfg(feature = "remote")]
use reqwest::blocking::Client;
#[cfg(feature = "remote")]
use std::time::Duration;

type ClickHandler = Arc<dyn Fn(&mut EventCtx<'_>) + Send + Sync>;
type ReadyHandler = Box<dyn FnOnce(&mut Page) + Send>;

/// Identity of an element within the loaded document: its position in a
/// depth-first traversal of the element tree. Stable for the lifetime of
/// one loaded document; invalidated by a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

// Resolve a selector to the first matching element's document-order index.
fn resolve(html: &str, selector: &str) -> Option<ElementId> {
    let sel = Selector::parse(selector).ok()?;
    let doc = Html::parse_document(html);
    let target = doc.select(&sel).next()?;
    let target_id = target.id();
    doc.root_element()
        .descendants()
        .filter_map(scraper::ElementRef::wrap)
        .position(|el| el.id() == target_id)
        .map(ElementId)
}

fn outer_html(html: &str, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let doc = Html::parse_document(html);
    doc.select(&sel).next().map(|el| el.html())
}

/// Context handed to click handlers during dispatch.
///
/// Gives read access to the loaded document and lets a handler enqueue
/// further synthetic clicks without re-entering the page.
pub struct EventCtx<'a> {
    html: &'a str,
    url: Option<&'a str>,
    pending: &'a mut VecDeque<ElementId>,
}

impl EventCtx<'_> {
    /// Enqueue a synthetic activation of the first element matching
    /// `selector`. Returns `false` (and does nothing) when no element
    /// matches.
    pub fn click(&mut self, selector: &str) -> bool {
        match resolve(self.html, selector) {
            Some(id) => {
                self.pending.push_back(id);
                true
            }
            None => {
                log::debug!("click target {} not present; ignoring", selector);
                false
            }
        }
    }

    /// Serialized HTML of the first element matching `selector`, if any.
    pub fn outer_html(&self, selector: &str) -> Option<String> {
        outer_html(self.html, selector)
    }

    /// Base URL of the loaded document, when it was fetched from one.
    pub fn base_url(&self) -> Option<&str> {
        self.url
    }
}

/// A loaded page with click listeners and a one-shot ready signal.
pub struct Page {
    html: Option<String>,
    url: Option<String>,
    #[cfg(feature = "remote")]
    client: Client,
    user_agent: String,
    listeners: HashMap<ElementId, Vec<ClickHandler>>,
    pending: VecDeque<ElementId>,
    ready_fired: bool,
    on_ready: Vec<ReadyHandler>,
}

impl Page {
    /// Create an empty page. Nothing is loaded yet; the ready signal fires
    /// on the first successful load.
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        #[cfg(feature = "remote")]
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            html: None,
            url: None,
            #[cfg(feature = "remote")]
            client,
            user_agent: config.user_agent.clone(),
            listeners: HashMap::new(),
            pending: VecDeque::new(),
            ready_fired: false,
            on_ready: Vec::new(),
        })
    }

    /// Load a document from an HTML string. `base_url`, when given, is used
    /// to resolve relative resource references during capture.
    ///
    /// Loading replaces the document: existing click listeners and queued
    /// events belong to the previous document and are dropped. The ready
    /// signal fires on the first load only; a reload does not re-fire it.
    pub fn load_html(&mut self, html: &str, base_url: Option<&str>) {
        self.html = Some(html.to_string());
        self.url = base_url.map(|s| s.to_string());
        self.listeners.clear();
        self.pending.clear();
        self.fire_ready();
    }

    /// Fetch a document over HTTP and load it. The stored base URL is the
    /// final URL after redirects.
    #[cfg(feature = "remote")]
    pub fn load_url(&mut self, url: &str) -> Result<()> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent.clone())
            .send()
            .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;

        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;

        self.load_html(&body, Some(&final_url));
        Ok(())
    }

    /// Register a callback for the one-shot ready signal. If the signal has
    /// already fired, the callback runs immediately.
    pub fn on_ready<F>(&mut self, cb: F)
    where
        F: FnOnce(&mut Page) + Send + 'static,
    {
        if self.ready_fired {
            cb(self);
        } else {
            self.on_ready.push(Box::new(cb));
        }
    }

    fn fire_ready(&mut self) {
        if self.ready_fired {
            return;
        }
        self.ready_fired = true;
        let callbacks = std::mem::take(&mut self.on_ready);
        for cb in callbacks {
            cb(self);
        }
    }

    /// Resolve the first element matching `selector`, if present.
    pub fn find(&self, selector: &str) -> Option<ElementId> {
        resolve(self.html.as_deref()?, selector)
    }

    /// Serialized HTML of the first element matching `selector`, if any.
    pub fn outer_html(&self, selector: &str) -> Option<String> {
        outer_html(self.html.as_deref()?, selector)
    }

    /// Base URL of the loaded document, when it was fetched from one.
    pub fn base_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Bind a click handler to the first element matching `selector`.
    /// Binding to an absent element is a silent no-op; returns whether the
    /// handler was bound.
    pub fn on_click<F>(&mut self, selector: &str, handler: F) -> bool
    where
        F: Fn(&mut EventCtx<'_>) + Send + Sync + 'static,
    {
        match self.find(selector) {
            Some(id) => {
                self.listeners.entry(id).or_default().push(Arc::new(handler));
                true
            }
            None => {
                log::debug!("no element matches {}; listener not bound", selector);
                false
            }
        }
    }

    /// Activate the first element matching `selector` and pump the event
    /// queue until idle. Clicking a missing element is a silent no-op;
    /// returns whether an element was activated.
    pub fn click(&mut self, selector: &str) -> bool {
        let id = match self.find(selector) {
            Some(id) => id,
            None => {
                log::debug!("click target {} not present; ignoring", selector);
                return false;
            }
        };
        self.pending.push_back(id);
        self.pump();
        true
    }

    // Drain the event queue in FIFO order. Handlers run on this thread and
    // may enqueue further events through their context.
    fn pump(&mut self) {
        while let Some(id) = self.pending.pop_front() {
            let handlers = self.listeners.get(&id).cloned().unwrap_or_default();
            if handlers.is_empty() {
                continue;
            }
            let html = self.html.clone().unwrap_or_default();
            let url = self.url.clone();
            let mut ctx = EventCtx {
                html: &html,
                url: url.as_deref(),
                pending: &mut self.pending,
            };
            for handler in &handlers {
                handler(&mut ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOC: &str = r#"<html><body>
        <button id="capture-btn">Capture</button>
        <div class="itinerary-section"><p>Day 1</p></div>
        <button class="download-btn">PDF</button>
        <button id="quick-pdf-btn">Quick</button>
    </body></html>"#;

    fn page_with(html: &str) -> Page {
        let mut page = Page::new(&CaptureConfig::default()).expect("create page");
        page.load_html(html, None);
        page
    }

    #[test]
    fn find_resolves_ids_and_classes() {
        let page = page_with(DOC);
        assert!(page.find("#capture-btn").is_some());
        assert!(page.find(".itinerary-section").is_some());
        assert!(page.find("#nope").is_none());
        assert_ne!(page.find("#capture-btn"), page.find("#quick-pdf-btn"));
    }

    #[test]
    fn click_dispatches_to_bound_handler() {
        let mut page = page_with(DOC);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        assert!(page.on_click("#capture-btn", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(page.click("#capture-btn"));
        assert!(page.click("#capture-btn"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn click_on_missing_element_is_noop() {
        let mut page = page_with(DOC);
        assert!(!page.click("#missing"));
    }

    #[test]
    fn bind_to_missing_element_is_noop() {
        let mut page = page_with(DOC);
        assert!(!page.on_click("#missing", |_| {}));
    }

    #[test]
    fn handler_can_forward_clicks_through_ctx() {
        let mut page = page_with(DOC);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        page.on_click(".download-btn", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        page.on_click("#quick-pdf-btn", |ctx| {
            ctx.click(".download-btn");
        });

        page.click("#quick-pdf-btn");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ready_fires_once_and_late_registration_runs_immediately() {
        let mut page = Page::new(&CaptureConfig::default()).expect("create page");
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        page.on_ready(move |_| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        page.load_html(DOC, None);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Reload does not re-fire the one-shot signal.
        page.load_html(DOC, None);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // A callback registered after the signal runs immediately.
        let fired_clone = fired.clone();
        page.on_ready(move |_| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reload_drops_listeners_from_previous_document() {
        let mut page = page_with(DOC);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        page.on_click("#capture-btn", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        page.load_html(DOC, None);
        page.click("#capture-btn");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn outer_html_returns_region_markup() {
        let page = page_with(DOC);
        let html = page.outer_html(".itinerary-section").expect("region html");
        assert!(html.contains("Day 1"));
        assert!(page.outer_html(".absent").is_none());
    }
}
