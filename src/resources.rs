//! Image resource loading for the rasterizer.
//!
//! Inline `data:` URIs are always decodable. HTTP(S) sources are fetched
//! only when the `remote` feature is enabled, subject to the cross-origin
//! policy: same-origin images always load, cross-origin images load only
//! when the capture was configured with `cross_origin`. A source that
//! cannot (or may not) be loaded paints as a placeholder; it never fails
//! the capture.

use crate::download;

#[cfg(feature = "remote")]
use reqwest::blocking::Client;
#[cfg(feature = "remote")]
use std::time::Duration;
#[cfg(feature = "remote")]
use url::Url;

/// Decoded RGBA8 pixels, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePixels {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Loader owned by the rasterizer worker; one per worker, reused across jobs.
pub struct ImageLoader {
    #[cfg(feature = "remote")]
    client: Option<Client>,
    #[cfg(feature = "remote")]
    user_agent: String,
}

impl ImageLoader {
    pub fn new(user_agent: &str, timeout_ms: u64) -> Self {
        #[cfg(feature = "remote")]
        {
            let client = Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build();
            if let Err(ref e) = client {
                log::warn!("image fetching disabled, failed to build HTTP client: {}", e);
            }
            Self {
                client: client.ok(),
                user_agent: user_agent.to_string(),
            }
        }
        #[cfg(not(feature = "remote"))]
        {
            let _ = (user_agent, timeout_ms);
            Self {}
        }
    }

    /// Resolve and decode one image source. Returns `None` when the source
    /// is absent, disallowed by the cross-origin policy, unfetchable, or
    /// undecodable.
    pub fn load(&self, src: &str, base_url: Option<&str>, cross_origin: bool) -> Option<ImagePixels> {
        if src.starts_with("data:") {
            let (mime, bytes) = download::decode_data_uri(src).ok()?;
            if !mime.starts_with("image/") {
                return None;
            }
            return decode_bytes(&bytes);
        }

        #[cfg(feature = "remote")]
        {
            self.fetch(src, base_url, cross_origin)
        }

        #[cfg(not(feature = "remote"))]
        {
            let _ = (base_url, cross_origin);
            log::debug!("skipping image {} (built without the remote feature)", src);
            None
        }
    }

    #[cfg(feature = "remote")]
    fn fetch(&self, src: &str, base_url: Option<&str>, cross_origin: bool) -> Option<ImagePixels> {
        let client = self.client.as_ref()?;
        let base = base_url.and_then(|b| Url::parse(b).ok());
        let resolved = match &base {
            Some(base) => base.join(src).ok()?,
            None => Url::parse(src).ok()?,
        };
        if is_cross_origin(&resolved, base.as_ref()) && !cross_origin {
            log::debug!("skipping cross-origin image {}", resolved);
            return None;
        }

        let resp = client
            .get(resolved.clone())
            .header("User-Agent", self.user_agent.clone())
            .send()
            .ok()?;
        let bytes = resp.bytes().ok()?;
        decode_bytes(&bytes)
    }
}

// Without a document origin, every fetched source counts as cross-origin.
#[cfg(feature = "remote")]
fn is_cross_origin(resolved: &Url, base: Option<&Url>) -> bool {
    match base {
        Some(base) => resolved.origin() != base.origin(),
        None => true,
    }
}

fn decode_bytes(bytes: &[u8]) -> Option<ImagePixels> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::debug!("undecodable image resource: {}", e);
            return None;
        }
    };
    let (width, height) = decoded.dimensions();
    Some(ImagePixels {
        width,
        height,
        data: decoded.into_raw(),
    })
}
