//! PDF rendering: wraps and paginates layout blocks, then draws them with the
//! Helvetica base fonts.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use thiserror::Error;

use crate::documents::font_metrics::{get_metrics, FontFace};
use crate::documents::layout::{Align, LayoutBlock};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("nothing to render")]
    Empty,
}

/// US Letter with 0.75 inch margins, in points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;
const LINE_HEIGHT_FACTOR: f32 = 1.2;
const LAYER_NAME: &str = "Layer 1";

/// One positioned line of text. Coordinates are in points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub size: f32,
    pub bold: bool,
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Wraps every text block to the content width and assigns lines to pages.
///
/// Space before a block is dropped at the top of a page.
pub fn paginate(blocks: &[LayoutBlock]) -> Vec<Vec<PlacedLine>> {
    let content_width = PAGE_WIDTH - 2.0 * MARGIN;
    let top = PAGE_HEIGHT - MARGIN;

    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut cursor = top;

    for block in blocks {
        let (kind, text) = match block {
            LayoutBlock::Spacer(gap) => {
                cursor -= gap;
                continue;
            }
            LayoutBlock::Text { kind, text } => (*kind, text),
        };

        let style = kind.style();
        let face = if style.bold {
            FontFace::HelveticaBold
        } else {
            FontFace::Helvetica
        };
        let metrics = get_metrics(face);
        let line_height = style.size * LINE_HEIGHT_FACTOR;
        let available = content_width - style.indent;

        if cursor < top {
            cursor -= style.space_before;
        }

        for line in metrics.wrap(text, style.size, available) {
            if cursor - line_height < MARGIN {
                pages.push(Vec::new());
                cursor = top;
            }
            let x = match style.align {
                Align::Left => MARGIN + style.indent,
                Align::Center => {
                    MARGIN + (content_width - metrics.measure_pt(&line, style.size)) / 2.0
                }
            };
            let placed = PlacedLine {
                baseline: cursor - style.size,
                x,
                size: style.size,
                bold: style.bold,
                text: line,
            };
            if let Some(page) = pages.last_mut() {
                page.push(placed);
            }
            cursor -= line_height;
        }

        cursor -= style.space_after;
    }

    pages.retain(|page| !page.is_empty());
    pages
}

/// Renders the blocks to PDF bytes.
pub fn render_pdf(blocks: &[LayoutBlock]) -> Result<Vec<u8>, PdfError> {
    let pages = paginate(blocks);
    if pages.is_empty() {
        return Err(PdfError::Empty);
    }

    let (doc, first_page, first_layer) = PdfDocument::new(
        "Optimized CV",
        pt_to_mm(PAGE_WIDTH),
        pt_to_mm(PAGE_HEIGHT),
        LAYER_NAME,
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Render(e.to_string()))?;

    for (i, lines) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) =
                doc.add_page(pt_to_mm(PAGE_WIDTH), pt_to_mm(PAGE_HEIGHT), LAYER_NAME);
            doc.get_page(page).get_layer(layer)
        };
        for line in lines {
            let font: &IndirectFontRef = if line.bold { &bold } else { &regular };
            layer.use_text(
                line.text.as_str(),
                line.size,
                pt_to_mm(line.x),
                pt_to_mm(line.baseline),
                font,
            );
        }
    }

    doc.save_to_bytes()
        .map_err(|e| PdfError::Render(e.to_string()))
}
