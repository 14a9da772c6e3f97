//! Error types for the capture toolkit

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the capture toolkit
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load a page
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// Failed to render a region
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to encode or decode an artifact
    #[error("Encoding failed: {0}")]
    EncodeError(String),

    /// Failed to deliver a download
    #[error("Download failed: {0}")]
    DownloadError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
