//! Upload validation: reject non-PDF uploads before any bytes are parsed.
//!
//! The two checks are split so the HTTP layer can run them at the right
//! moments: [`validate_file_type`] needs only the multipart headers and runs
//! *before* the body is read; [`validate_not_empty`] runs on the received
//! bytes *before* any PDF parsing is attempted. [`validate`] re-runs both for
//! library callers that build an [`UploadedDocument`] directly.

use crate::error::AnalyzeError;

/// One uploaded file, alive for the duration of a single request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Filename as declared by the client.
    pub filename: String,
    /// Content type as declared by the client, if any.
    pub content_type: Option<String>,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Content types accepted for a PDF upload. Browsers occasionally send
/// `application/octet-stream` for drag-and-dropped files, so it is allowed.
const ACCEPTED_CONTENT_TYPES: &[&str] =
    &["application/pdf", "application/x-pdf", "application/octet-stream"];

/// Reject uploads whose name or declared content type is not a PDF.
///
/// Runs on headers only — no upload bytes are inspected here.
pub fn validate_file_type(filename: &str, content_type: Option<&str>) -> Result<(), AnalyzeError> {
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AnalyzeError::InvalidFileType {
            filename: filename.to_string(),
        });
    }
    if let Some(declared) = content_type {
        // Strip any "; charset=..." parameter before comparing.
        let essence = declared.split(';').next().unwrap_or(declared).trim();
        if !ACCEPTED_CONTENT_TYPES
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
        {
            return Err(AnalyzeError::InvalidFileType {
                filename: filename.to_string(),
            });
        }
    }
    Ok(())
}

/// Reject zero-byte uploads before any PDF parsing is attempted.
pub fn validate_not_empty(bytes: &[u8]) -> Result<(), AnalyzeError> {
    if bytes.is_empty() {
        return Err(AnalyzeError::EmptyUpload);
    }
    Ok(())
}

/// Run both ingress checks on an assembled upload.
pub fn validate(upload: &UploadedDocument) -> Result<(), AnalyzeError> {
    validate_file_type(&upload.filename, upload.content_type.as_deref())?;
    validate_not_empty(&upload.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_is_accepted_case_insensitively() {
        assert!(validate_file_type("invoice.pdf", None).is_ok());
        assert!(validate_file_type("INVOICE.PDF", None).is_ok());
        assert!(validate_file_type("archive.2024.pdf", Some("application/pdf")).is_ok());
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let err = validate_file_type("notes.txt", None).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILE_TYPE");
        assert!(validate_file_type("", None).is_err());
        assert!(validate_file_type("pdf", None).is_err());
    }

    #[test]
    fn mismatched_content_type_is_rejected() {
        let err = validate_file_type("fake.pdf", Some("text/html")).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILE_TYPE");
    }

    #[test]
    fn octet_stream_and_charset_params_are_tolerated() {
        assert!(validate_file_type("doc.pdf", Some("application/octet-stream")).is_ok());
        assert!(validate_file_type("doc.pdf", Some("application/pdf; charset=binary")).is_ok());
    }

    #[test]
    fn empty_bytes_are_rejected() {
        assert_eq!(validate_not_empty(&[]).unwrap_err().code(), "EMPTY_FILE");
        assert!(validate_not_empty(b"%PDF-1.5").is_ok());
    }

    #[test]
    fn file_type_is_checked_before_emptiness() {
        // A nameless empty upload must fail on the type check, not the
        // emptiness check: the type check consumes no upload bytes.
        let upload = UploadedDocument {
            filename: "payload.exe".into(),
            content_type: None,
            bytes: Vec::new(),
        };
        assert_eq!(validate(&upload).unwrap_err().code(), "INVALID_FILE_TYPE");
    }
}
