//! Transient download links and the downloads sink.
//!
//! A [`DownloadLink`] plays the role of a synthetic anchor: a filename plus
//! a data-URI target, never part of any page, activated once and dropped.
//! The [`Downloads`] sink is the save mechanism: it decodes the link's data
//! URI and writes the bytes into its directory, overwriting a previous
//! artifact of the same name so repeated captures do not accumulate files.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Encode PNG bytes as a `data:image/png;base64,` URI.
pub fn png_data_uri(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// Decode a base64 data URI into its MIME type and payload bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::EncodeError("not a data URI".into()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| Error::EncodeError("data URI is not base64-encoded".into()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::EncodeError(format!("invalid base64 payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

/// A transient download: target filename plus a data-URI href.
#[derive(Debug, Clone)]
pub struct DownloadLink {
    filename: String,
    href: String,
}

impl DownloadLink {
    pub fn new(filename: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            href: href.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Activate the link against a sink, invoking the save mechanism once.
    pub fn click(&self, sink: &Downloads) -> Result<PathBuf> {
        sink.accept(self)
    }
}

/// File-writing sink with an in-memory log of completed downloads.
pub struct Downloads {
    dir: PathBuf,
    completed: Mutex<Vec<PathBuf>>,
}

impl Downloads {
    /// Create a sink writing into `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::DownloadError(format!("cannot create {}: {}", dir.display(), e)))?;
        Ok(Self {
            dir,
            completed: Mutex::new(Vec::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Materialize one link as a file. The filename must be a bare name;
    /// anything path-like is rejected.
    pub fn accept(&self, link: &DownloadLink) -> Result<PathBuf> {
        let name = link.filename();
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(Error::DownloadError(format!("unsafe filename: {}", name)));
        }
        let (mime, bytes) = decode_data_uri(link.href())?;
        let path = self.dir.join(name);
        std::fs::write(&path, &bytes)
            .map_err(|e| Error::DownloadError(format!("cannot write {}: {}", path.display(), e)))?;
        log::debug!("saved {} ({}, {} bytes)", path.display(), mime, bytes.len());

        let mut completed = self.completed.lock().unwrap();
        completed.push(path.clone());
        Ok(path)
    }

    /// Paths of every completed download, in completion order. Repeated
    /// same-name downloads appear once per activation even though they
    /// overwrite on disk.
    pub fn completed(&self) -> Vec<PathBuf> {
        self.completed.lock().unwrap().clone()
    }
}
