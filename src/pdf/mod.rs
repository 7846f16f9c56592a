//! PDF operations: merge, annotate and rasterize

pub mod document;
pub mod merge;
pub mod annotate;
pub mod raster;

// Re-export commonly used items
pub use document::{count_pages, open_document, page_box, page_frame, save_document};
pub use merge::{merge_pdfs, MergeOptions};
pub use annotate::{annotate_document, annotate_pdf, AnnotateOptions};
pub use raster::{page_image_path, rasterize_pdf, PdfiumRasterizer, Rasterizer, RasterizeOptions};
