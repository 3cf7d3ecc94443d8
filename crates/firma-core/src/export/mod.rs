//! Flatten text fields and signatures into a copy of the source PDF

mod canvas;
mod plan;

use firma_types::{SignatureField, TextField};
use lopdf::{Document, ObjectId};
use serde::{Deserialize, Serialize};

use crate::coords::{image_origin, text_origin, MediaBox, NormalizedPoint, TextOffset};
use crate::error::FirmaError;
use crate::fonts::{FontBook, FontKey, FontSource, FontStats};
pub(crate) use canvas::page_media_box;
use canvas::{ImageCache, PageCanvas};
use plan::{image_ops, line_ops, parse_hex_color, plan_pages, single_line, text_ops};

/// Prefix of exported file names.
pub const EXPORT_PREFIX: &str = "firma-";
pub const DEFAULT_EXPORT_NAME: &str = "firma-document.pdf";

/// Tunables for [`export_pdf`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        let offset = TextOffset::default();
        Self {
            offset_x: offset.x,
            offset_y: offset.y,
        }
    }
}

impl ExportOptions {
    pub fn text_offset(&self) -> TextOffset {
        TextOffset {
            x: self.offset_x,
            y: self.offset_y,
        }
    }
}

/// What an export drew.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Pages that received an overlay, ascending
    pub pages: Vec<u32>,
    pub texts: usize,
    /// Underline and strikethrough strokes
    pub lines: usize,
    pub images: usize,
    pub fonts: FontStats,
    /// Fields naming a page the document does not have
    pub skipped_fields: usize,
}

impl ExportSummary {
    pub fn is_unchanged(&self) -> bool {
        self.pages.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub summary: ExportSummary,
}

/// Default download name for an export of `original`.
pub fn export_file_name(original: Option<&str>) -> String {
    match original.map(str::trim) {
        Some(name) if !name.is_empty() => format!("{}{}", EXPORT_PREFIX, name),
        _ => DEFAULT_EXPORT_NAME.to_string(),
    }
}

/// Burn `text_fields` and `signature_fields` into the pages of `pdf_bytes`.
///
/// Returns the source bytes untouched when nothing is drawable. Font lookups
/// that fail fall back to Helvetica; every other failure aborts the export.
pub async fn export_pdf(
    pdf_bytes: &[u8],
    text_fields: &[TextField],
    signature_fields: &[SignatureField],
    font_source: &dyn FontSource,
    options: &ExportOptions,
) -> Result<ExportedPdf, FirmaError> {
    let plan = plan_pages(text_fields, signature_fields);
    if plan.is_empty() {
        // Nothing to draw, return original
        return Ok(ExportedPdf {
            bytes: pdf_bytes.to_vec(),
            summary: ExportSummary::default(),
        });
    }

    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| FirmaError::ParseError(e.to_string()))?;
    let pages = doc.get_pages();

    let mut summary = ExportSummary::default();
    let mut fonts = FontBook::new(font_source);
    let mut images = ImageCache::new();
    let offset = options.text_offset();

    for (page_num, page_plan) in &plan {
        let Some(&page_id) = pages.get(page_num) else {
            let count = page_plan.texts.len() + page_plan.signatures.len();
            tracing::warn!(
                page = page_num,
                fields = count,
                pages = pages.len(),
                "Skipping fields on a page the document does not have"
            );
            summary.skipped_fields += count;
            continue;
        };

        let media_box = page_media_box(&doc, page_id);
        let mut canvas = PageCanvas::new(page_id);

        for field in &page_plan.texts {
            draw_text(
                &mut doc,
                &mut fonts,
                &mut canvas,
                field,
                media_box,
                offset,
                &mut summary,
            )
            .await?;
        }
        for field in &page_plan.signatures {
            draw_signature(&mut doc, &mut images, &mut canvas, field, media_box)?;
            summary.images += 1;
        }

        if !canvas.is_empty() {
            canvas.commit(&mut doc)?;
            summary.pages.push(*page_num);
        }
    }

    summary.fonts = fonts.finish(&mut doc)?;

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| FirmaError::OperationError(e.to_string()))?;

    tracing::info!(
        pages = summary.pages.len(),
        texts = summary.texts,
        images = summary.images,
        embedded_fonts = summary.fonts.embedded,
        fallback_fonts = summary.fonts.fallback,
        bytes = output.len(),
        "PDF exported"
    );

    Ok(ExportedPdf {
        bytes: output,
        summary,
    })
}

async fn draw_text(
    doc: &mut Document,
    fonts: &mut FontBook<'_>,
    canvas: &mut PageCanvas,
    field: &TextField,
    media_box: MediaBox,
    offset: TextOffset,
    summary: &mut ExportSummary,
) -> Result<(), FirmaError> {
    let key = FontKey::new(field.font_family.clone(), field.is_bold, field.is_italic);
    let handle = fonts.load(doc, &key).await;
    let text = single_line(&field.text);
    let laid_out = fonts.lay_out(handle, &text, field.font_size)?;

    let (font_name, font_id): (&str, ObjectId) = fonts.resource(handle);
    canvas.use_font(font_name, font_id);

    let color = parse_hex_color(&field.color);
    let (x, y) = text_origin(
        NormalizedPoint::new(field.x, field.y),
        field.font_size,
        media_box,
        offset,
    );
    tracing::debug!(id = %field.id, page = field.page, x, y, width = laid_out.width, "Drawing text");

    canvas.extend(text_ops(font_name, field.font_size, color, (x, y), laid_out.operand));
    summary.texts += 1;

    let thickness = field.font_size / 15.0;
    if field.is_underline {
        canvas.extend(line_ops((x, y - 2.0), laid_out.width, thickness, color));
        summary.lines += 1;
    }
    if field.is_strikethrough {
        canvas.extend(line_ops(
            (x, y + field.font_size / 3.0),
            laid_out.width,
            thickness,
            color,
        ));
        summary.lines += 1;
    }
    Ok(())
}

fn draw_signature(
    doc: &mut Document,
    images: &mut ImageCache,
    canvas: &mut PageCanvas,
    field: &SignatureField,
    media_box: MediaBox,
) -> Result<(), FirmaError> {
    let (name, image_id) = images.embed(doc, &field.data_url)?;
    canvas.use_image(&name, image_id);

    let origin = image_origin(NormalizedPoint::new(field.x, field.y), field.height, media_box);
    tracing::debug!(id = %field.id, page = field.page, x = origin.0, y = origin.1, "Drawing signature");
    canvas.extend(image_ops(&name, origin, (field.width, field.height)));
    Ok(())
}
