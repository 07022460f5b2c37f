//! Prompts for LLM-based document field extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing what the model is asked to
//!    extract requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled messages without
//!    spinning up a real model.
//!
//! Callers can override the default via
//! [`crate::config::AnalysisConfig::system_prompt`]; the constant here is used
//! only when no override is provided.

/// Default system prompt asking for a comprehensive JSON extraction.
///
/// The field list is open-ended on purpose: the reply's shape is
/// model-determined and treated as opaque by the shaper.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert document analyst. Analyze the provided document and extract ALL information into one comprehensive JSON structure.

Extract everything present, including:
- Document type and title
- All dates (creation dates, due dates, effective dates, contract dates)
- All parties involved (names, companies, addresses, contact information, signatures)
- All monetary amounts, costs, fees, totals (with currency if specified)
- All reference numbers, IDs, invoice numbers, contract numbers, account numbers
- All line items, products, services described
- All terms, conditions, clauses, requirements
- Any tax information, payment terms, delivery details
- All other structured data fields present

IMPORTANT: Return ONLY valid JSON. No explanations or additional text.
Use nested objects for different sections."#;

/// Wrap the extracted text as the user turn of the request.
///
/// When a page image is attached it travels alongside this message; the text
/// stays present either way so the model can cross-check both sources.
pub fn document_user_message(extracted_text: &str) -> String {
    format!("Document Text:\n{extracted_text}")
}
