//! Paragraph-level chunking of extracted policy text.
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Blank-line paragraph boundary, tolerant of trailing whitespace on the
/// separating lines.
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));

/// A paragraph-sized unit of extracted document text.
///
/// Serialized form doubles as the vector-store metadata payload, so field
/// names match the stored wire format (`sequence` travels as `"chunk"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    #[serde(deserialize_with = "lenient_index")]
    pub page: usize,
    #[serde(rename = "chunk", deserialize_with = "lenient_index")]
    pub sequence: usize,
    pub source: String,
}

/// The vector store returns numeric metadata as floats; accept both forms.
fn lenient_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value as usize)
}

/// Split page-ordered text into paragraph chunks.
///
/// Pages and paragraphs are numbered 1-based; blank pages and
/// whitespace-only paragraphs are dropped entirely.
pub fn chunk_pages(pages: &[String], source: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for (page_idx, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            continue;
        }

        for (para_idx, paragraph) in PARAGRAPH_BREAK.split(page).enumerate() {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            chunks.push(Chunk {
                text: paragraph.to_string(),
                page: page_idx + 1,
                sequence: para_idx + 1,
                source: source.to_string(),
            });
        }
    }

    chunks
}
