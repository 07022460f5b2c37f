//! Report types and the wire envelope returned to HTTP callers.
//!
//! Everything here is created and discarded within one request; there is no
//! cross-request state anywhere in the crate.

use crate::error::AnalyzeError;
use serde::{Deserialize, Serialize};

/// The outcome of one full analysis request.
///
/// Exactly one of `structured_data` / `ai_analysis` is set:
///
/// * `structured_data` — the model replied with (something containing) a
///   parseable JSON object; the object is passed through opaquely, no schema
///   is enforced on its fields.
/// * `ai_analysis` — the reply carried no parseable JSON; the raw text is
///   returned with `metadata.note` explaining the parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    pub metadata: AnalysisMetadata,
}

/// Bookkeeping attached to every [`AnalysisReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Length in chars of the assembled extraction before truncation.
    pub character_count: usize,
    /// Total pages in the document, blank pages included.
    pub page_count: usize,
    /// Size of the uploaded file.
    pub file_size_bytes: usize,
    /// Identifier of the model that produced the analysis.
    pub extraction_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text_preview: Option<String>,
    /// Present only on the raw-text fallback path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The debug endpoint's payload: raw extraction, no analyzer involved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub extracted_text: String,
    pub character_count: usize,
    pub page_count: usize,
    pub note: String,
}

/// Wire envelope for every JSON endpoint.
///
/// The analysis endpoint always answers with this shape at HTTP 200 — errors
/// become `success=false` plus a stable `error_code` — so clients never have
/// to handle a bare transport failure on the primary path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful envelope wrapping a payload.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    /// Failure envelope carrying the error message and its wire code.
    pub fn failure(err: &AnalyzeError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_code: Some(err.code().to_string()),
        }
    }
}
