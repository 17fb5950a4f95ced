//! Page-ordered text extraction from PDF documents.
//!
//! Byte-level PDF parsing is delegated to `lopdf`; this module only turns a
//! document into the page texts the chunker consumes.
use std::path::Path;

use anyhow::{Context, Result};
use lopdf::Document;
use tracing::debug;

/// Extract the text of every page of a PDF, in page order.
///
/// A page whose text cannot be extracted contributes an empty string, which
/// the chunker drops; only a document that cannot be opened at all is an
/// error.
pub fn extract_pages<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let doc = Document::load(path)
        .with_context(|| format!("failed to load PDF: {}", path.display()))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                debug!("no extractable text on page {page_number}: {e}");
                pages.push(String::new());
            }
        }
    }

    Ok(pages)
}
