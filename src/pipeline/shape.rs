//! Response shaping: pull a structured result out of a free-text model reply.
//!
//! The model is told to answer with JSON only, but replies routinely arrive
//! wrapped in prose ("Here is the extracted data: {...} Let me know…"). The
//! shaper scans for the outermost brace span and tries to parse it; anything
//! that fails degrades to a raw-text fallback rather than an error, because a
//! readable model reply still has value to the caller.
//!
//! Every function here is pure (`&str → value`), making the stage trivially
//! unit-testable without a model in the loop.

use serde_json::Value;
use tracing::debug;

/// Outcome of shaping one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Shaped {
    /// The reply contained a parseable JSON object; passed through opaquely.
    Structured(Value),
    /// No parseable JSON found; the raw reply plus a note describing why.
    Fallback { raw: String, note: String },
}

/// Locate the candidate JSON span: first `{` through last `}`.
///
/// Known limitation, kept deliberately as the documented contract: this is a
/// span heuristic, not a JSON scanner. A reply containing multiple JSON
/// objects, or braces in surrounding commentary, yields a span covering all
/// of them — which then fails to parse and falls back. Nested braces inside
/// one object are fine because the outermost pair encloses them.
pub fn extract_json_span(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

/// Shape a free-text reply into a [`Shaped`] result.
pub fn shape_reply(reply: &str) -> Shaped {
    let Some(span) = extract_json_span(reply) else {
        debug!("No JSON span in model reply; using raw-text fallback");
        return Shaped::Fallback {
            raw: reply.to_string(),
            note: "AI analysis provided as text - JSON structure not detected".to_string(),
        };
    };

    match serde_json::from_str::<Value>(span) {
        Ok(value) => Shaped::Structured(value),
        Err(e) => {
            debug!(error = %e, "JSON span failed to parse; using raw-text fallback");
            Shaped::Fallback {
                raw: reply.to_string(),
                note: format!("JSON parsing failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_object_parses() {
        let reply = r#"{"document_type": "invoice", "total": "42.00"}"#;
        assert_eq!(
            shape_reply(reply),
            Shaped::Structured(json!({"document_type": "invoice", "total": "42.00"}))
        );
    }

    #[test]
    fn object_buried_in_commentary_parses() {
        let reply = "Sure! Here is the extracted data:\n{\"parties\": [\"Acme\"]}\nHope that helps.";
        assert_eq!(
            shape_reply(reply),
            Shaped::Structured(json!({"parties": ["Acme"]}))
        );
    }

    #[test]
    fn nested_braces_stay_inside_the_span() {
        let reply = r#"{"amounts": {"net": "10", "gross": {"eur": "12"}}}"#;
        match shape_reply(reply) {
            Shaped::Structured(value) => {
                assert_eq!(value["amounts"]["gross"]["eur"], "12");
            }
            other => panic!("expected structured result, got {other:?}"),
        }
    }

    #[test]
    fn multiple_objects_fall_back() {
        // The heuristic spans both objects; the span is not valid JSON.
        let reply = r#"{"a": 1} and also {"b": 2}"#;
        match shape_reply(reply) {
            Shaped::Fallback { raw, note } => {
                assert_eq!(raw, reply);
                assert!(note.contains("JSON parsing failed"), "note: {note}");
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn no_braces_fall_back_with_note() {
        let reply = "I could not find any structured data in this document.";
        match shape_reply(reply) {
            Shaped::Fallback { raw, note } => {
                assert_eq!(raw, reply);
                assert!(!note.is_empty());
                assert!(note.contains("not detected"), "note: {note}");
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn reversed_braces_are_no_span() {
        assert_eq!(extract_json_span("} backwards {"), None);
        assert_eq!(extract_json_span(""), None);
        assert_eq!(extract_json_span("no braces here"), None);
    }

    #[test]
    fn span_covers_first_open_to_last_close() {
        let reply = "x {\"a\": {\"b\": 1}} y";
        assert_eq!(extract_json_span(reply), Some("{\"a\": {\"b\": 1}}"));
    }
}
