//! Error types for the PDF tools library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF tools library
#[derive(Error, Debug)]
pub enum Error {
    /// Input path is missing or is not a readable PDF
    #[error("Cannot open document {}: {reason}", .path.display())]
    DocumentOpen { path: PathBuf, reason: String },

    /// Destination could not be written
    #[error("Cannot save document {}: {reason}", .path.display())]
    DocumentSave { path: PathBuf, reason: String },

    /// Image format outside the allow-list
    #[error("Unsupported image format: {0} (expected one of: jpg, jpeg, gif, png)")]
    UnsupportedFormat(String),

    /// A required command parameter was not supplied
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// Rasterization resolution that would produce an empty or inverted image
    #[error("Invalid resolution: {0} DPI (must be greater than zero)")]
    InvalidResolution(u32),

    /// A single page failed to render
    #[error("Failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    /// The rendering engine could not be loaded or failed outside a page
    #[error("Rendering engine error: {0}")]
    Engine(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Command line could not be parsed
    #[error("{0}")]
    Usage(#[from] clap::Error),
}

impl Error {
    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DocumentOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn save(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DocumentSave {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
