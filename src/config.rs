//! Styling and output configuration
//!
//! Every fixed value used by the annotate and rasterize operations lives here
//! with a documented default, so callers and tests can override one field at a
//! time with struct update syntax.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// RGB color with components in the 0.0..=1.0 range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    /// PDF fill color operator (`rg`) for this color
    pub fn fill_operator(&self) -> String {
        format!("{} {} {} rg", self.r, self.g, self.b)
    }
}

/// Watermark text and how it is drawn on each page
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyle {
    /// Text stamped on every page
    pub text: String,
    /// Opacity percentage; 0 is invisible, 100 is opaque. Not clamped.
    pub opacity: i32,
    /// Font size in points
    pub font_size: f32,
    /// Counter-clockwise rotation of the text baseline, in degrees
    pub rotation_degrees: f32,
    /// Distance below the page center where the text starts, in points
    pub vertical_offset: f32,
    /// Fill color
    pub color: Rgb,
    /// Base font name (one of the 14 standard PDF fonts)
    pub font: String,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            text: "Watermark".to_string(),
            opacity: 20,
            font_size: 12.0,
            rotation_degrees: 90.0,
            vertical_offset: 300.0,
            color: Rgb::BLACK,
            font: "Helvetica".to_string(),
        }
    }
}

impl WatermarkStyle {
    /// Alpha value handed to the PDF graphics state (opacity / 100)
    pub fn alpha(&self) -> f32 {
        self.opacity as f32 / 100.0
    }
}

/// Timestamp text drawn near the top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampStyle {
    /// chrono format string
    pub format: String,
    /// Font size in points
    pub font_size: f32,
    /// Horizontal distance from the left edge, in points
    pub inset_x: f32,
    /// Distance of the baseline below the top edge, in points
    pub inset_y: f32,
    pub color: Rgb,
}

impl Default for TimestampStyle {
    fn default() -> Self {
        Self {
            format: "%Y-%m-%d %H:%M:%S".to_string(),
            font_size: 12.0,
            inset_x: 10.0,
            inset_y: 10.0,
            color: Rgb::BLACK,
        }
    }
}

/// Image formats accepted by the rasterize operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Jpg,
    Jpeg,
    Gif,
    Png,
}

impl ImageFormat {
    /// File extension used for output images
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
        }
    }

    /// Encoder used by the `image` crate
    pub fn encoder(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpg | ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" => Ok(ImageFormat::Jpg),
            "jpeg" => Ok(ImageFormat::Jpeg),
            "gif" => Ok(ImageFormat::Gif),
            "png" => Ok(ImageFormat::Png),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Resolution and output format for rasterization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterConfig {
    /// Output resolution in dots per inch
    pub resolution: u32,
    /// Resolution at which one PDF point maps to one pixel
    pub reference_dpi: f32,
    pub format: ImageFormat,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            resolution: 300,
            reference_dpi: 72.0,
            format: ImageFormat::Jpg,
        }
    }
}

impl RasterConfig {
    /// Uniform scale factor applied to both page axes
    pub fn scale(&self) -> f32 {
        self.resolution as f32 / self.reference_dpi
    }
}
