//! Error types for the docsight library.
//!
//! [`AnalyzeError`] covers every way a request can fail before a report is
//! produced. An *unparseable model reply* is deliberately not here: the shaper
//! degrades it to a raw-text fallback report (see [`crate::pipeline::shape`]),
//! so the caller still receives a successful envelope.
//!
//! Each variant carries a stable wire code via [`AnalyzeError::code`]; the
//! HTTP layer copies that code into the `error_code` field of the response
//! envelope so clients can branch without parsing English prose.

use thiserror::Error;

/// All request-level failures surfaced by the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    // ── Ingress errors ────────────────────────────────────────────────────
    /// Uploaded file is not a PDF by extension or declared content type.
    #[error("Invalid file type: '{filename}' — expected a .pdf upload")]
    InvalidFileType { filename: String },

    /// Upload contained zero bytes.
    #[error("Empty file received")]
    EmptyUpload,

    /// Multipart body could not be read, or no file field was present.
    #[error("Unreadable upload: {detail}")]
    UploadUnreadable { detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The byte stream is not a parseable PDF container.
    #[error("PDF processing error: {detail}")]
    MalformedDocument { detail: String },

    /// Every page yielded empty or whitespace-only text.
    #[error("Could not extract text from PDF")]
    NoExtractableText,

    // ── Analysis errors ───────────────────────────────────────────────────
    /// The model call failed (transport, timeout, or API error). Single
    /// best-effort call, never retried.
    #[error("Model analysis failed: {detail}")]
    AnalysisUnavailable { detail: String },

    /// No model credential/provider available at startup. This is a
    /// configuration error, not a per-request one.
    #[error("LLM provider is not configured: {hint}")]
    ProviderNotConfigured { hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalyzeError {
    /// Stable machine-readable code reported in the `error_code` envelope field.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzeError::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            AnalyzeError::EmptyUpload => "EMPTY_FILE",
            AnalyzeError::UploadUnreadable { .. } => "UPLOAD_UNREADABLE",
            AnalyzeError::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            AnalyzeError::NoExtractableText => "NO_TEXT_EXTRACTED",
            AnalyzeError::AnalysisUnavailable { .. } => "ANALYSIS_UNAVAILABLE",
            AnalyzeError::ProviderNotConfigured { .. } => "PROVIDER_NOT_CONFIGURED",
            AnalyzeError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// True for failures caused by the client's upload rather than the
    /// service or its collaborators. Used by the debug endpoint to pick an
    /// HTTP status class.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalyzeError::InvalidFileType { .. }
                | AnalyzeError::EmptyUpload
                | AnalyzeError::UploadUnreadable { .. }
                | AnalyzeError::MalformedDocument { .. }
                | AnalyzeError::NoExtractableText
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_file_type_display_names_the_file() {
        let e = AnalyzeError::InvalidFileType {
            filename: "report.docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("report.docx"), "got: {msg}");
        assert_eq!(e.code(), "INVALID_FILE_TYPE");
    }

    #[test]
    fn analysis_unavailable_keeps_the_cause() {
        let e = AnalyzeError::AnalysisUnavailable {
            detail: "HTTP 503 from provider".into(),
        };
        assert!(e.to_string().contains("503"));
        assert_eq!(e.code(), "ANALYSIS_UNAVAILABLE");
        assert!(!e.is_client_error());
    }

    #[test]
    fn upload_errors_are_client_errors() {
        assert!(AnalyzeError::EmptyUpload.is_client_error());
        assert!(AnalyzeError::MalformedDocument {
            detail: "bad xref".into()
        }
        .is_client_error());
        assert!(!AnalyzeError::ProviderNotConfigured {
            hint: "set OPENAI_API_KEY".into()
        }
        .is_client_error());
    }
}
