//! PDF export of a prediction.
//!
//! Layout is computed first (positions in millimetres, PDF origin at the
//! bottom-left) and then drawn with a builtin Helvetica font. Builtin fonts
//! only cover a single-byte encoding, so text is reduced to printable ASCII.

use crate::report::record::ResultRecord;
use anyhow::Result;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::borrow::Cow;

pub const PDF_FILE_NAME: &str = "customer_churn_prediction.pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCUMENT_TITLE: &str = "Customer Churn Prediction Results";

/// A4 portrait
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_MM: f64 = 10.0;
pub const BOTTOM_MARGIN_MM: f64 = 15.0;
pub const CELL_WIDTH_MM: f64 = 200.0;
pub const LINE_HEIGHT_MM: f64 = 10.0;
pub const FONT_SIZE_PT: f64 = 12.0;

/// Inner padding of a left-aligned cell
const CELL_PADDING_MM: f64 = 1.0;
const MM_PER_PT: f64 = 25.4 / 72.0;

/// Replacement for characters the builtin font cannot encode
pub const REPLACEMENT_CHAR: char = '?';

/// Helvetica advance widths for ' ' ..= '~', in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' - '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0' - '9'
    278, 278, 584, 584, 584, 556, 1015, // ':' - '@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A' - 'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N' - 'Z'
    278, 278, 278, 469, 556, 333, // '[' - '`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a' - 'm'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n' - 'z'
    334, 260, 334, 584, // '{' - '~'
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One positioned text line
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    pub align: Align,
    /// Zero-based page number
    pub page: usize,
    /// Left edge of the text
    pub x_mm: f64,
    /// Baseline, measured from the bottom of the page
    pub baseline_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub page_count: usize,
    pub lines: Vec<LayoutLine>,
}

/// Reduce text to printable ASCII, substituting everything else
pub fn sanitize_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(|c| matches!(c, ' '..='~')) {
        return Cow::Borrowed(text);
    }

    Cow::Owned(
        text.chars()
            .map(|c| if matches!(c, ' '..='~') { c } else { REPLACEMENT_CHAR })
            .collect(),
    )
}

/// Rendered width of sanitized text in Helvetica at the given size
pub fn text_width_mm(text: &str, font_size_pt: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let index = (c as u32).wrapping_sub(' ' as u32) as usize;
            HELVETICA_WIDTHS
                .get(index)
                .copied()
                .unwrap_or(HELVETICA_WIDTHS[(REPLACEMENT_CHAR as usize) - 32]) as u32
        })
        .sum();

    units as f64 / 1000.0 * font_size_pt * MM_PER_PT
}

/// Lay out the centred title followed by one `key: value` line per entry
pub fn layout_document(record: &ResultRecord) -> DocumentLayout {
    let mut rows: Vec<(String, Align)> = Vec::with_capacity(record.len() + 1);
    rows.push((DOCUMENT_TITLE.to_string(), Align::Center));
    rows.extend(
        record
            .entries()
            .iter()
            .map(|(key, value)| (sanitize_text(&format!("{}: {}", key, value)).into_owned(), Align::Left)),
    );

    let font_height_mm = FONT_SIZE_PT * MM_PER_PT;
    let page_break_at = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM;

    let mut page = 0;
    let mut top = MARGIN_MM;
    let mut lines = Vec::with_capacity(rows.len());

    for (text, align) in rows {
        if top + LINE_HEIGHT_MM > page_break_at {
            page += 1;
            top = MARGIN_MM;
        }

        let x_mm = match align {
            Align::Left => MARGIN_MM + CELL_PADDING_MM,
            Align::Center => MARGIN_MM + (CELL_WIDTH_MM - text_width_mm(&text, FONT_SIZE_PT)) / 2.0,
        };
        // Vertically centred in the cell
        let baseline_from_top = top + LINE_HEIGHT_MM / 2.0 + 0.3 * font_height_mm;

        lines.push(LayoutLine {
            text,
            align,
            page,
            x_mm,
            baseline_mm: PAGE_HEIGHT_MM - baseline_from_top,
        });
        top += LINE_HEIGHT_MM;
    }

    DocumentLayout {
        page_count: page + 1,
        lines,
    }
}

/// Draw a layout into PDF bytes
pub fn render_pdf(layout: &DocumentLayout) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        DOCUMENT_TITLE,
        Mm(PAGE_WIDTH_MM as f32),
        Mm(PAGE_HEIGHT_MM as f32),
        "Layer 1",
    );

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("Failed to add builtin font: {:?}", e))?;

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for _ in 1..layout.page_count {
        let (page, layer) = doc.add_page(
            Mm(PAGE_WIDTH_MM as f32),
            Mm(PAGE_HEIGHT_MM as f32),
            "Layer 1",
        );
        layers.push(doc.get_page(page).get_layer(layer));
    }

    for line in &layout.lines {
        let Some(layer) = layers.get(line.page) else {
            anyhow::bail!("Layout line on page {} beyond page count", line.page);
        };
        layer.use_text(
            line.text.as_str(),
            FONT_SIZE_PT as f32,
            Mm(line.x_mm as f32),
            Mm(line.baseline_mm as f32),
            &font,
        );
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow::anyhow!("Failed to serialize PDF: {:?}", e))
}

/// Lay out and render the document export
pub fn export_pdf(record: &ResultRecord) -> Result<Vec<u8>> {
    render_pdf(&layout_document(record))
}
