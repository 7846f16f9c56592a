//! Page geometry and placement calculations
//!
//! All coordinates are PDF user-space points (1/72 inch) with the origin at
//! the bottom-left of the page. Placement is computed against the page as a
//! viewer shows it (crop region, `/Rotate` applied) and then mapped back into
//! user space. Offsets in the styles are measured from the top edge, so they
//! are flipped here.

use crate::config::{TimestampStyle, WatermarkStyle};

/// Points per inch in PDF user space
pub const POINTS_PER_INCH: f32 = 72.0;

/// A position in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A page rectangle (MediaBox or CropBox) in user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    /// Build a box from the four rectangle numbers, normalizing corner order
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self::from_corners(0.0, 0.0, 612.0, 792.0)
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self::from_corners(0.0, 0.0, 595.0, 842.0)
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Overlap with `other`, or `None` when they do not intersect
    pub fn intersect(&self, other: &PageBox) -> Option<PageBox> {
        let clipped = PageBox {
            llx: self.llx.max(other.llx),
            lly: self.lly.max(other.lly),
            urx: self.urx.min(other.urx),
            ury: self.ury.min(other.ury),
        };
        (clipped.width() > 0.0 && clipped.height() > 0.0).then_some(clipped)
    }

    /// Pixel size of this page when rendered at `scale` pixels per point
    pub fn pixel_size(&self, scale: f32) -> (u32, u32) {
        let to_pixels = |points: f32| (points * scale).round().max(0.0) as u32;
        (to_pixels(self.width()), to_pixels(self.height()))
    }
}

/// The page as a viewer shows it: the visible box turned clockwise by the
/// page's `/Rotate` value
///
/// Placement is worked out in viewer coordinates (origin at the visual
/// bottom-left, y up) and mapped back into user space with [`PageFrame::to_user`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub visible: PageBox,
    /// Clockwise quarter turn in degrees: 0, 90, 180 or 270
    pub rotation: u32,
}

impl PageFrame {
    /// `rotate` is the raw `/Rotate` value; it is reduced to a quarter turn
    pub fn new(visible: PageBox, rotate: i64) -> Self {
        let quarter_turns = (rotate.rem_euclid(360) + 45) / 90 % 4;
        Self {
            visible,
            rotation: quarter_turns as u32 * 90,
        }
    }

    pub fn upright(visible: PageBox) -> Self {
        Self::new(visible, 0)
    }

    fn is_sideways(&self) -> bool {
        self.rotation % 180 == 90
    }

    /// Width as seen in a viewer
    pub fn width(&self) -> f32 {
        if self.is_sideways() {
            self.visible.height()
        } else {
            self.visible.width()
        }
    }

    /// Height as seen in a viewer
    pub fn height(&self) -> f32 {
        if self.is_sideways() {
            self.visible.width()
        } else {
            self.visible.height()
        }
    }

    /// Map a viewer-space point to PDF user space
    pub fn to_user(&self, point: Point) -> Point {
        let (w, h) = (self.visible.width(), self.visible.height());
        let (dx, dy) = match self.rotation {
            90 => (w - point.y, point.x),
            180 => (w - point.x, h - point.y),
            270 => (point.y, h - point.x),
            _ => (point.x, point.y),
        };
        Point {
            x: self.visible.llx + dx,
            y: self.visible.lly + dy,
        }
    }

    /// User-space angle that appears as `degrees` counter-clockwise in a viewer
    pub fn text_angle(&self, degrees: f32) -> f32 {
        degrees + self.rotation as f32
    }

    /// Text matrix placing a baseline at `origin` (viewer space) that reads at
    /// `degrees` counter-clockwise in a viewer
    pub fn text_matrix(&self, degrees: f32, origin: Point) -> [f32; 6] {
        rotated_text_matrix(self.text_angle(degrees), self.to_user(origin))
    }
}

/// Where the watermark baseline starts, in viewer space: horizontally
/// centered, and `vertical_offset` points below the vertical center.
pub fn watermark_origin(frame: &PageFrame, style: &WatermarkStyle) -> Point {
    Point {
        x: frame.width() / 2.0,
        y: frame.height() / 2.0 - style.vertical_offset,
    }
}

/// Where the timestamp baseline starts in viewer space, inset from the
/// top-left corner
pub fn timestamp_origin(frame: &PageFrame, style: &TimestampStyle) -> Point {
    Point {
        x: style.inset_x,
        y: frame.height() - style.inset_y,
    }
}

/// Text matrix `[a b c d e f]` rotating counter-clockwise by `degrees` about `origin`
pub fn rotated_text_matrix(degrees: f32, origin: Point) -> [f32; 6] {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin(), radians.cos());
    [snap(cos), snap(sin), snap(-sin), snap(cos), origin.x, origin.y]
}

/// Drop float noise so that quarter turns produce exact 0 and ±1 in the
/// content stream (and never `-0`)
fn snap(value: f32) -> f32 {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-6 {
        rounded + 0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_size() {
        let letter = PageBox::letter();
        assert_eq!(letter.width(), 8.5 * POINTS_PER_INCH);
        assert_eq!(letter.height(), 11.0 * POINTS_PER_INCH);
    }

    #[test]
    fn test_corners_are_normalized() {
        let page = PageBox::from_corners(612.0, 792.0, 0.0, 0.0);
        assert_eq!(page, PageBox::letter());
    }

    #[test]
    fn test_watermark_origin_on_letter() {
        let frame = PageFrame::upright(PageBox::letter());
        let origin = frame.to_user(watermark_origin(&frame, &WatermarkStyle::default()));
        assert_eq!(origin.x, 306.0);
        // 792 - (396 + 300)
        assert_eq!(origin.y, 96.0);
    }

    #[test]
    fn test_watermark_origin_respects_offset_box() {
        let frame = PageFrame::upright(PageBox::from_corners(100.0, 50.0, 712.0, 842.0));
        let origin = frame.to_user(watermark_origin(&frame, &WatermarkStyle::default()));
        assert_eq!(origin.x, 406.0);
        assert_eq!(origin.y, 146.0);
    }

    #[test]
    fn test_timestamp_origin() {
        let frame = PageFrame::upright(PageBox::a4());
        let origin = frame.to_user(timestamp_origin(&frame, &TimestampStyle::default()));
        assert_eq!(origin, Point { x: 10.0, y: 832.0 });
    }

    #[test]
    fn test_rotate_is_reduced_to_quarter_turns() {
        assert_eq!(PageFrame::new(PageBox::letter(), 450).rotation, 90);
        assert_eq!(PageFrame::new(PageBox::letter(), -90).rotation, 270);
        assert_eq!(PageFrame::new(PageBox::letter(), 360).rotation, 0);
    }

    #[test]
    fn test_sideways_frame_swaps_dimensions() {
        let frame = PageFrame::new(PageBox::letter(), 90);
        assert_eq!((frame.width(), frame.height()), (792.0, 612.0));
    }

    #[test]
    fn test_viewer_top_left_on_rotated_pages() {
        let page = PageBox::letter();
        let top_left = |rotate| {
            let frame = PageFrame::new(page, rotate);
            frame.to_user(Point { x: 0.0, y: frame.height() })
        };
        // Each clockwise quarter turn brings the next user-space corner to the viewer's top-left
        assert_eq!(top_left(0), Point { x: 0.0, y: 792.0 });
        assert_eq!(top_left(90), Point { x: 0.0, y: 0.0 });
        assert_eq!(top_left(180), Point { x: 612.0, y: 0.0 });
        assert_eq!(top_left(270), Point { x: 612.0, y: 792.0 });
    }

    #[test]
    fn test_timestamp_reads_horizontally_on_rotated_page() {
        let frame = PageFrame::new(PageBox::letter(), 90);
        let m = frame.text_matrix(0.0, timestamp_origin(&frame, &TimestampStyle::default()));
        assert_eq!(m, [0.0, 1.0, -1.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_cropped_frame_offsets_placement() {
        let frame = PageFrame::upright(PageBox::from_corners(100.0, 100.0, 512.0, 692.0));
        let stamp = frame.to_user(timestamp_origin(&frame, &TimestampStyle::default()));
        assert_eq!(stamp, Point { x: 110.0, y: 682.0 });
    }

    #[test]
    fn test_intersect() {
        let media = PageBox::letter();
        let crop = PageBox::from_corners(-50.0, 100.0, 500.0, 900.0);
        assert_eq!(media.intersect(&crop), Some(PageBox::from_corners(0.0, 100.0, 500.0, 792.0)));
        assert_eq!(media.intersect(&PageBox::from_corners(700.0, 0.0, 800.0, 10.0)), None);
    }

    #[test]
    fn test_rotation_matrix_90() {
        let m = rotated_text_matrix(90.0, Point { x: 5.0, y: 7.0 });
        assert_eq!(m, [0.0, 1.0, -1.0, 0.0, 5.0, 7.0]);
    }

    #[test]
    fn test_rotation_matrix_180_has_no_negative_zero() {
        let m = rotated_text_matrix(180.0, Point { x: 0.0, y: 0.0 });
        assert_eq!(m, [-1.0, 0.0, 0.0, -1.0, 0.0, 0.0]);
        assert!(m[1].is_sign_positive() && m[2].is_sign_positive());
    }

    #[test]
    fn test_rotation_matrix_identity() {
        let m = rotated_text_matrix(0.0, Point { x: 1.0, y: 2.0 });
        assert_eq!(m, [1.0, 0.0, 0.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_pixel_size_scales_linearly() {
        let page = PageBox::a4();
        assert_eq!(page.pixel_size(1.0), (595, 842));
        let (w1, h1) = page.pixel_size(150.0 / 72.0);
        let (w2, h2) = page.pixel_size(300.0 / 72.0);
        assert_eq!((w1, h1), (1240, 1754));
        assert!((w2 as i64 - 2 * w1 as i64).abs() <= 1);
        assert!((h2 as i64 - 2 * h1 as i64).abs() <= 1);
    }
}
