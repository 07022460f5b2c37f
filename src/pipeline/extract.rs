//! Text extraction: per-page PDF text with page markers and a char budget.
//!
//! ## Why spawn_blocking?
//!
//! Parsing a PDF and decoding its content streams is CPU-bound; on multi-MB
//! uploads it can take long enough to stall a Tokio worker thread. The
//! blocking implementation is therefore moved onto the blocking pool, same as
//! the rasteriser.
//!
//! ## Best-effort policy
//!
//! A page whose content stream fails to decode is skipped — logged at debug,
//! never fatal. Only a document that cannot be opened at all
//! ([`AnalyzeError::MalformedDocument`]) or that yields no text anywhere
//! ([`AnalyzeError::NoExtractableText`]) aborts the request.

use crate::error::AnalyzeError;
use lopdf::Document;
use tracing::{debug, info};

/// Concatenated per-page text, ready for the semantic analyzer.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Assembled `--- Page N ---` text, truncated to the budget.
    pub text: String,
    /// Surviving pages as `(1-based page number, trimmed page text)`,
    /// in document order. Pages with no text are absent.
    pub pages: Vec<(usize, String)>,
    /// Total pages in the document, blank pages included.
    pub page_count: usize,
    /// Length in chars of the assembled text before truncation.
    pub character_count: usize,
    /// True when the budget cut the assembled text short.
    pub truncated: bool,
}

/// Extract the document's text, truncated to `budget` chars.
///
/// Pass `usize::MAX` to disable truncation (the debug endpoint does).
pub async fn extract_text(bytes: &[u8], budget: usize) -> Result<ExtractedText, AnalyzeError> {
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || extract_text_blocking(&owned, budget))
        .await
        .map_err(|e| AnalyzeError::MalformedDocument {
            detail: format!("extraction task panicked: {e}"),
        })?
}

/// Blocking implementation of text extraction.
pub fn extract_text_blocking(bytes: &[u8], budget: usize) -> Result<ExtractedText, AnalyzeError> {
    let doc = Document::load_mem(bytes).map_err(|e| AnalyzeError::MalformedDocument {
        detail: e.to_string(),
    })?;

    // BTreeMap keys, so iteration is already in ascending page order.
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let page_count = page_numbers.len();
    info!(pages = page_count, "PDF loaded");

    let mut pages: Vec<(usize, String)> = Vec::new();
    let mut assembled = String::new();

    for page_num in page_numbers {
        let page_text = match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                debug!(page = page_num, error = %e, "Skipping page: extraction failed");
                continue;
            }
        };
        let trimmed = page_text.trim();
        if trimmed.is_empty() {
            // Whitespace-only pages never get a marker.
            continue;
        }
        assembled.push_str(&format!("--- Page {page_num} ---\n{trimmed}\n"));
        pages.push((page_num as usize, trimmed.to_string()));
    }

    let character_count = assembled.chars().count();
    let (text, truncated) = truncate_chars(assembled, budget);

    if text.trim().is_empty() {
        return Err(AnalyzeError::NoExtractableText);
    }

    debug!(
        chars = character_count,
        kept = text.chars().count(),
        truncated,
        "Extraction assembled"
    );

    Ok(ExtractedText {
        text,
        pages,
        page_count,
        character_count,
        truncated,
    })
}

/// Cut `s` down to at most `budget` chars (not bytes), on a char boundary.
fn truncate_chars(s: String, budget: usize) -> (String, bool) {
    match s.char_indices().nth(budget) {
        Some((byte_index, _)) => {
            let mut cut = s;
            cut.truncate(byte_index);
            (cut, true)
        }
        None => (s, false),
    }
}
