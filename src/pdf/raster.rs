//! Page rasterization
//!
//! The pixel work is done by a [`Rasterizer`]; this module decides the scale,
//! where each page image goes and how it is encoded. The production backend
//! is [`PdfiumRasterizer`], which binds the PDFium shared library at runtime.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use tracing::{debug, info};

use crate::config::{ImageFormat, RasterConfig};
use crate::error::{Error, Result};

/// Receives each rendered page: 0-based page index and its pixels
pub type PageSink<'a> = dyn FnMut(usize, RgbaImage) -> Result<()> + 'a;

/// Something that can turn every page of a PDF into pixels
pub trait Rasterizer {
    /// Render each page of `input` at `scale` pixels per point, in page order,
    /// handing every page to `sink`. Returns the number of pages rendered.
    ///
    /// Stops at the first page that fails to render or that `sink` rejects.
    fn rasterize(&self, input: &Path, scale: f32, sink: &mut PageSink<'_>) -> Result<usize>;
}

/// Rasterizer backed by PDFium
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind to PDFium, looking next to the working directory first and then in
    /// the system library paths
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Error::Engine(format!("failed to load the PDFium library: {:?}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, input: &Path, scale: f32, sink: &mut PageSink<'_>) -> Result<usize> {
        if !input.exists() {
            return Err(Error::open(input, "file not found"));
        }

        let document = self
            .pdfium
            .load_pdf_from_file(input, None)
            .map_err(|e| Error::open(input, format!("{:?}", e)))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let mut rendered = 0;
        for (index, page) in document.pages().iter().enumerate() {
            let render_error = |reason: String| Error::Render { page: index + 1, reason };

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| render_error(format!("{:?}", e)))?;

            let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
            let pixels = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
                .ok_or_else(|| render_error("bitmap size does not match its dimensions".to_string()))?;

            sink(index, pixels)?;
            rendered += 1;
        }

        Ok(rendered)
    }
}

/// Options for rasterizing a PDF
#[derive(Debug, Clone)]
pub struct RasterizeOptions {
    /// PDF to render
    pub input_path: PathBuf,
    /// Directory receiving `page_<N>.<ext>` files; created if missing
    pub output_dir: PathBuf,
    pub config: RasterConfig,
}

impl RasterizeOptions {
    /// Checks that need no rendering engine: a usable resolution and an
    /// existing input
    pub fn validate(&self) -> Result<()> {
        if self.config.resolution == 0 {
            return Err(Error::InvalidResolution(self.config.resolution));
        }
        if !self.input_path.exists() {
            return Err(Error::open(&self.input_path, "file not found"));
        }
        Ok(())
    }
}

/// Path of the image for a 1-based page number
pub fn page_image_path(output_dir: &Path, page_number: usize, format: ImageFormat) -> PathBuf {
    output_dir.join(format!("page_{}.{}", page_number, format.extension()))
}

/// Render every page of a PDF to an image file, returning the page count
///
/// The scale is `resolution / reference_dpi` on both axes. Pages are written
/// as they are rendered; if one fails the error is returned and images
/// already written stay on disk.
///
/// # Example
///
/// ```no_run
/// use pdf_tools::config::{ImageFormat, RasterConfig};
/// use pdf_tools::pdf::{rasterize_pdf, PdfiumRasterizer, RasterizeOptions};
/// use std::path::PathBuf;
///
/// let rasterizer = PdfiumRasterizer::bind().expect("PDFium not available");
/// let options = RasterizeOptions {
///     input_path: PathBuf::from("in.pdf"),
///     output_dir: PathBuf::from("pages"),
///     config: RasterConfig { resolution: 150, format: ImageFormat::Png, ..Default::default() },
/// };
///
/// rasterize_pdf(&rasterizer, &options).expect("Failed to rasterize");
/// ```
pub fn rasterize_pdf<R: Rasterizer + ?Sized>(rasterizer: &R, options: &RasterizeOptions) -> Result<usize> {
    options.validate()?;
    let config = options.config;

    fs::create_dir_all(&options.output_dir)?;

    let scale = config.scale();
    debug!(resolution = config.resolution, scale, format = %config.format, "rasterizing");

    let mut save_page = |index: usize, pixels: RgbaImage| -> Result<()> {
        let path = page_image_path(&options.output_dir, index + 1, config.format);
        // JPEG has no alpha channel, and rendered pages are opaque anyway
        DynamicImage::ImageRgba8(pixels)
            .into_rgb8()
            .save_with_format(&path, config.format.encoder())?;
        debug!(page = index + 1, path = %path.display(), "wrote page image");
        Ok(())
    };

    let pages = rasterizer.rasterize(&options.input_path, scale, &mut save_page)?;

    info!(
        pages,
        output = %options.output_dir.display(),
        "rasterized document"
    );

    Ok(pages)
}
