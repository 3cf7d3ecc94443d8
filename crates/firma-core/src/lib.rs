//! Field placement and PDF flattening
//!
//! Text fields and signature placements live in a [`FieldStore`] as
//! zoom-independent anchors. [`export_pdf`] burns them into a copy of the
//! source document using lopdf; fonts come from a pluggable [`FontSource`].

pub mod coords;
pub mod data_url;
pub mod dates;
pub mod error;
pub mod export;
pub mod fonts;
pub mod session;
pub mod signatures;
pub mod store;

pub use coords::{MediaBox, NormalizedPoint, ScreenPoint, TextOffset};
pub use error::FirmaError;
pub use export::{export_file_name, export_pdf, ExportOptions, ExportSummary, ExportedPdf};
pub use fonts::{FontSource, FontSourceConfig, HttpFontSource, OfflineFontSource};
pub use session::{content_hash, FileSessionStore, MemorySessionStore, SessionStore};
pub use signatures::SignatureLibrary;
pub use store::{FieldPatch, FieldSeed, FieldStore};

/// Page numbers with their media boxes, in page order
pub fn page_boxes(bytes: &[u8]) -> Result<Vec<(u32, MediaBox)>, FirmaError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| FirmaError::ParseError(e.to_string()))?;
    Ok(doc
        .get_pages()
        .into_iter()
        .map(|(number, id)| (number, export::page_media_box(&doc, id)))
        .collect())
}
