//! Watermark and timestamp overlays written directly into page content
//!
//! Each page keeps its original content streams. They are bracketed with a
//! `q`/`Q` pair so any transform they leave behind is undone, and a new
//! stream drawing the overlay text is appended after them, so the overlay
//! renders on top.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, warn};

use crate::config::{TimestampStyle, WatermarkStyle};
use crate::date::timestamp_now;
use crate::error::Result;
use crate::layout::{timestamp_origin, watermark_origin};
use crate::pdf::document::{inherited_attribute, open_document, page_frame, page_ids, resolve, save_document};

/// Resource name of the overlay font
const FONT_RESOURCE: &str = "PdfToolsFont";
/// Resource name of the watermark transparency state
const ALPHA_RESOURCE: &str = "PdfToolsAlpha";

/// What to stamp on every page
#[derive(Debug, Clone, Default)]
pub struct AnnotateOptions {
    pub watermark: WatermarkStyle,
    /// Stamp the invocation time as well, when set
    pub timestamp: Option<TimestampStyle>,
}

/// Stamp the watermark (and optional timestamp) on every page of `input_path`
/// and write the result to `output_path`. Returns the number of pages stamped.
///
/// The timestamp is taken once, so every page carries the same string.
///
/// # Example
///
/// ```no_run
/// use pdf_tools::config::{TimestampStyle, WatermarkStyle};
/// use pdf_tools::pdf::{annotate_pdf, AnnotateOptions};
/// use std::path::Path;
///
/// let options = AnnotateOptions {
///     watermark: WatermarkStyle {
///         text: "DRAFT".to_string(),
///         opacity: 50,
///         ..Default::default()
///     },
///     timestamp: Some(TimestampStyle::default()),
/// };
///
/// annotate_pdf(Path::new("in.pdf"), Path::new("out.pdf"), &options)
///     .expect("Failed to annotate");
/// ```
pub fn annotate_pdf(input_path: &Path, output_path: &Path, options: &AnnotateOptions) -> Result<usize> {
    let mut doc = open_document(input_path)?;

    if !(0..=100).contains(&options.watermark.opacity) {
        warn!(
            opacity = options.watermark.opacity,
            "opacity outside 0-100 is passed to the PDF unchanged"
        );
    }

    let stamp = options.timestamp.as_ref().map(timestamp_now);
    let page_count = annotate_document(&mut doc, options, stamp.as_deref())?;

    save_document(&mut doc, output_path)?;

    info!(
        pages = page_count,
        output = %output_path.display(),
        "annotated document"
    );

    Ok(page_count)
}

/// Overlay every page of an in-memory document
///
/// `stamp` is the already formatted timestamp; it is drawn only when both it
/// and `options.timestamp` are present.
pub fn annotate_document(doc: &mut Document, options: &AnnotateOptions, stamp: Option<&str>) -> Result<usize> {
    let pages = page_ids(doc);
    if pages.is_empty() {
        return Ok(0);
    }

    let font_id = add_standard_font(doc, &options.watermark.font);
    let alpha_id = add_alpha_state(doc, options.watermark.alpha());
    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

    for (index, page_id) in pages.iter().enumerate() {
        let frame = page_frame(doc, *page_id);

        let watermark = &options.watermark;
        let mut content = String::from("Q\n");
        content.push_str(&watermark_content(
            watermark,
            frame.text_matrix(watermark.rotation_degrees, watermark_origin(&frame, watermark)),
        ));
        if let (Some(style), Some(text)) = (&options.timestamp, stamp) {
            content.push_str(&timestamp_content(style, frame.text_matrix(0.0, timestamp_origin(&frame, style)), text));
        }

        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        add_overlay_resources(doc, *page_id, font_id, alpha_id)?;
        wrap_page_content(doc, *page_id, open_id, overlay_id)?;

        debug!(
            page = index + 1,
            width = frame.width(),
            height = frame.height(),
            rotation = frame.rotation,
            "stamped page"
        );
    }

    Ok(pages.len())
}

/// Content stream drawing the translucent watermark text with text matrix `m`
fn watermark_content(style: &WatermarkStyle, m: [f32; 6]) -> String {
    format!(
        "q\n/{ALPHA_RESOURCE} gs\n{color}\nBT\n/{FONT_RESOURCE} {size} Tf\n0 Tr\n{tm} Tm\n({text}) Tj\nET\nQ\n",
        color = style.color.fill_operator(),
        size = style.font_size,
        tm = matrix_operands(&m),
        text = escape_pdf_string(&style.text),
    )
}

/// Content stream drawing the opaque timestamp with text matrix `m`
fn timestamp_content(style: &TimestampStyle, m: [f32; 6], text: &str) -> String {
    format!(
        "q\n{color}\nBT\n/{FONT_RESOURCE} {size} Tf\n0 Tr\n{tm} Tm\n({text}) Tj\nET\nQ\n",
        color = style.color.fill_operator(),
        size = style.font_size,
        tm = matrix_operands(&m),
        text = escape_pdf_string(text),
    )
}

fn matrix_operands(m: &[f32; 6]) -> String {
    m.iter().map(f32::to_string).collect::<Vec<_>>().join(" ")
}

/// Escape a string for a PDF literal in WinAnsiEncoding
///
/// Latin-1 characters are written as octal escapes; anything outside Latin-1
/// has no WinAnsi code and becomes `?`.
fn escape_pdf_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            ' '..='~' => escaped.push(ch),
            '\u{a0}'..='\u{ff}' => escaped.push_str(&format!("\\{:03o}", ch as u32)),
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// One of the 14 standard PDF fonts, so nothing needs embedding
fn add_standard_font(doc: &mut Document, base_font: &str) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    doc.add_object(Object::Dictionary(font))
}

fn add_alpha_state(doc: &mut Document, alpha: f32) -> ObjectId {
    let mut state = Dictionary::new();
    state.set("Type", Object::Name(b"ExtGState".to_vec()));
    state.set("ca", Object::Real(alpha));
    state.set("CA", Object::Real(alpha));
    doc.add_object(Object::Dictionary(state))
}

/// Give the page its own Resources dictionary containing the overlay font and
/// graphics state alongside whatever it already used
fn add_overlay_resources(doc: &mut Document, page_id: ObjectId, font_id: ObjectId, alpha_id: ObjectId) -> Result<()> {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .as_ref()
        .and_then(|res| resolve(doc, res))
        .and_then(|res| res.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut fonts = sub_dictionary(doc, &resources, b"Font");
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut states = sub_dictionary(doc, &resources, b"ExtGState");
    states.set(ALPHA_RESOURCE, Object::Reference(alpha_id));
    resources.set("ExtGState", Object::Dictionary(states));

    // Set on the page itself so pages sharing a Resources object stay independent
    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));

    Ok(())
}

/// Copy of a resource category (Font, ExtGState, ...), dereferenced if indirect
fn sub_dictionary(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .and_then(|object| resolve(doc, object))
        .and_then(|object| object.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new)
}

/// Contents becomes `[q, original..., Q+overlay]`
fn wrap_page_content(doc: &mut Document, page_id: ObjectId, open_id: ObjectId, overlay_id: ObjectId) -> Result<()> {
    let mut contents = vec![Object::Reference(open_id)];
    match doc.get_dictionary(page_id)?.get(b"Contents").ok() {
        Some(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        // An indirect Contents may point at a single stream or at an array of them
        Some(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
            _ => contents.push(Object::Reference(*id)),
        },
        _ => {}
    }
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}
