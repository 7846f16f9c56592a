//! PDF Tools Library
//!
//! Batch operations on PDF documents:
//! - Merge documents, keeping every page in input order
//! - Stamp a rotated, translucent watermark and an optional timestamp on every page
//! - Rasterize every page to a JPEG, GIF or PNG image at a chosen resolution
//!
//! # Example
//!
//! ```no_run
//! use pdf_tools::pdf::{MergeOptions, merge_pdfs};
//! use std::path::PathBuf;
//!
//! let options = MergeOptions {
//!     input_paths: vec![
//!         PathBuf::from("intro.pdf"),
//!         PathBuf::from("appendix.pdf"),
//!     ],
//!     output_path: PathBuf::from("merged.pdf"),
//! };
//!
//! merge_pdfs(&options).expect("Failed to merge PDFs");
//! ```

pub mod error;
pub mod config;
pub mod layout;
pub mod date;
pub mod pdf;
pub mod cli;

// Re-export commonly used items
pub use error::{Error, Result};
pub use cli::{parse_command, Cli, Command, Report};
