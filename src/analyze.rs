//! Request orchestration: one linear pipeline from upload to report.
//!
//! [`AnalysisService`] wires the stages together; [`DocumentAnalysis`] is the
//! seam the HTTP router is generic over, so integration tests can drive the
//! router against a stub without a PDF library or a model in the loop.
//!
//! Control flow is strictly sequential per request — no stage runs
//! concurrently with another, nothing is shared across requests, and nothing
//! is retried.

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::output::{AnalysisMetadata, AnalysisReport, ExtractionReport};
use crate::pipeline::extract::ExtractedText;
use crate::pipeline::ingress::UploadedDocument;
use crate::pipeline::llm::{LlmModel, SemanticAnalyzer, SemanticModel};
use crate::pipeline::shape::Shaped;
use crate::pipeline::{encode, extract, ingress, render, shape};
use crate::prompts;
use async_trait::async_trait;
use edgequake_llm::ImageData;
use std::sync::Arc;
use tracing::{info, warn};

/// The service surface the HTTP router depends on.
#[async_trait]
pub trait DocumentAnalysis: Send + Sync {
    /// Full pipeline: validate, extract, render (best-effort), analyze, shape.
    async fn analyze(&self, upload: UploadedDocument) -> Result<AnalysisReport, AnalyzeError>;

    /// Extraction only, untruncated — the debugging seam.
    async fn extract_only(&self, upload: UploadedDocument)
        -> Result<ExtractionReport, AnalyzeError>;

    /// Whether a model credential was available at startup.
    fn credential_configured(&self) -> bool;
}

/// Production implementation of [`DocumentAnalysis`].
pub struct AnalysisService {
    analyzer: SemanticAnalyzer,
    config: AnalysisConfig,
}

impl AnalysisService {
    /// Build a service from explicitly constructed model backends.
    pub fn new(
        text_model: Arc<dyn SemanticModel>,
        vision_model: Arc<dyn SemanticModel>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            analyzer: SemanticAnalyzer::new(text_model, vision_model),
            config,
        }
    }

    /// Build a service whose models come from the provider registry,
    /// validating the credential once, up front.
    ///
    /// Provider resolution, most-specific first:
    /// 1. `config.provider_name` when set.
    /// 2. The first provider whose API key is present in the environment
    ///    (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`).
    pub fn from_env(config: AnalysisConfig) -> Result<Self, AnalyzeError> {
        let provider_name = resolve_provider_name(&config)?;
        info!(provider = %provider_name, text_model = %config.text_model, vision_model = %config.vision_model, "Initialising model providers");
        let text_model = LlmModel::from_registry(&provider_name, &config.text_model, &config)?;
        let vision_model = LlmModel::from_registry(&provider_name, &config.vision_model, &config)?;
        Ok(Self::new(Arc::new(text_model), Arc::new(vision_model), config))
    }
}

/// Pick the provider registry entry to construct models from.
fn resolve_provider_name(config: &AnalysisConfig) -> Result<String, AnalyzeError> {
    if let Some(name) = &config.provider_name {
        return Ok(name.clone());
    }
    for (key, provider) in [
        ("OPENAI_API_KEY", "openai"),
        ("ANTHROPIC_API_KEY", "anthropic"),
        ("GEMINI_API_KEY", "gemini"),
    ] {
        if std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false) {
            return Ok(provider.to_string());
        }
    }
    Err(AnalyzeError::ProviderNotConfigured {
        hint: "no provider named and no API key found in the environment; \
               set OPENAI_API_KEY (or ANTHROPIC_API_KEY / GEMINI_API_KEY), \
               or pass --provider"
            .to_string(),
    })
}

#[async_trait]
impl DocumentAnalysis for AnalysisService {
    async fn analyze(&self, upload: UploadedDocument) -> Result<AnalysisReport, AnalyzeError> {
        // ── Step 1: Ingress checks ───────────────────────────────────────
        ingress::validate(&upload)?;
        let file_size_bytes = upload.bytes.len();
        info!(filename = %upload.filename, size = file_size_bytes, "Analyzing uploaded document");

        // ── Step 2: Extract text ─────────────────────────────────────────
        let extracted =
            extract::extract_text(&upload.bytes, self.config.extraction_budget).await?;

        // ── Step 3: Render page 1 (best-effort) ──────────────────────────
        let image = self.render_first_page(&upload.bytes).await;

        // ── Step 4: Model call ───────────────────────────────────────────
        let system_prompt = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(prompts::ANALYSIS_SYSTEM_PROMPT);
        let (reply, model_id) = self
            .analyzer
            .analyze(&extracted.text, image, system_prompt)
            .await?;

        // ── Step 5: Shape the reply ──────────────────────────────────────
        Ok(build_report(
            &extracted,
            file_size_bytes,
            &model_id,
            &reply,
            self.config.preview_chars,
        ))
    }

    async fn extract_only(
        &self,
        upload: UploadedDocument,
    ) -> Result<ExtractionReport, AnalyzeError> {
        ingress::validate(&upload)?;
        info!(filename = %upload.filename, size = upload.bytes.len(), "Debug extraction");

        // The debug surface returns the full text, untruncated.
        let extracted = extract::extract_text(&upload.bytes, usize::MAX).await?;
        Ok(ExtractionReport {
            extracted_text: extracted.text,
            character_count: extracted.character_count,
            page_count: extracted.page_count,
            note: "Raw text extraction for debugging".to_string(),
        })
    }

    fn credential_configured(&self) -> bool {
        // Construction requires a resolvable provider, so an existing
        // service always has its credential.
        true
    }
}

impl AnalysisService {
    /// Raster + encode page 1, degrading to `None` on any failure.
    async fn render_first_page(&self, bytes: &[u8]) -> Option<ImageData> {
        if !self.config.render_page_image {
            return None;
        }
        let image = render::render_page(bytes, 0, self.config.max_rendered_pixels).await?;
        match encode::encode_page(&image) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(error = %e, "Page image encoding failed; continuing text-only");
                None
            }
        }
    }
}

/// Assemble the response payload from the shaped reply and extraction stats.
fn build_report(
    extracted: &ExtractedText,
    file_size_bytes: usize,
    model_id: &str,
    reply: &str,
    preview_chars: usize,
) -> AnalysisReport {
    let preview = preview_text(&extracted.text, preview_chars);
    let mut metadata = AnalysisMetadata {
        character_count: extracted.character_count,
        page_count: extracted.page_count,
        file_size_bytes,
        extraction_method: model_id.to_string(),
        raw_text_preview: Some(preview),
        note: None,
    };

    match shape::shape_reply(reply) {
        Shaped::Structured(value) => AnalysisReport {
            structured_data: Some(value),
            ai_analysis: None,
            metadata,
        },
        Shaped::Fallback { raw, note } => {
            metadata.note = Some(note);
            AnalysisReport {
                structured_data: None,
                ai_analysis: Some(raw),
                metadata,
            }
        }
    }
}

/// First `limit` chars of the extraction, with an ellipsis when cut short.
fn preview_text(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fixtures::pdf_with_pages;
    use crate::pipeline::llm::{ModelError, ModelRequest};
    use std::sync::Mutex;

    struct StubModel {
        id: &'static str,
        reply: Result<String, String>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl StubModel {
        fn replying(id: &'static str, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                id,
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(id: &'static str, detail: &str) -> Arc<Self> {
            Arc::new(Self {
                id,
                reply: Err(detail.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SemanticModel for StubModel {
        async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(ModelError)
        }

        fn model_id(&self) -> &str {
            self.id
        }
    }

    fn service_with_reply(reply: &str) -> (AnalysisService, Arc<StubModel>) {
        let text_model = StubModel::replying("stub-text", reply);
        let vision_model = StubModel::replying("stub-vision", reply);
        // Rendering is disabled so the suite never depends on a native
        // pdfium library being present.
        let config = AnalysisConfig::builder()
            .render_page_image(false)
            .build()
            .expect("config");
        (
            AnalysisService::new(text_model.clone(), vision_model, config),
            text_model,
        )
    }

    fn pdf_upload(pages: &[&str]) -> UploadedDocument {
        UploadedDocument {
            filename: "sample.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: pdf_with_pages(pages),
        }
    }

    #[tokio::test]
    async fn json_reply_becomes_structured_data() {
        let (service, text_model) =
            service_with_reply(r#"Here you go: {"document_type": "invoice"}"#);
        let report = service
            .analyze(pdf_upload(&["Invoice #123", ""]))
            .await
            .expect("analysis");

        assert_eq!(
            report.structured_data,
            Some(serde_json::json!({"document_type": "invoice"}))
        );
        assert!(report.ai_analysis.is_none());
        assert_eq!(report.metadata.page_count, 2);
        assert_eq!(
            report.metadata.character_count,
            "--- Page 1 ---\nInvoice #123\n".chars().count()
        );
        assert_eq!(report.metadata.extraction_method, "stub-text");
        assert!(report
            .metadata
            .raw_text_preview
            .as_deref()
            .unwrap()
            .contains("Invoice #123"));

        // Text-only flow routes to the text model with the extraction inline.
        let requests = text_model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user.contains("--- Page 1 ---"));
        assert!(requests[0].image.is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_to_raw_text() {
        let (service, _) = service_with_reply("Nothing structured to report here.");
        let report = service
            .analyze(pdf_upload(&["Invoice #123"]))
            .await
            .expect("analysis");

        assert!(report.structured_data.is_none());
        assert_eq!(
            report.ai_analysis.as_deref(),
            Some("Nothing structured to report here.")
        );
        let note = report.metadata.note.expect("note");
        assert!(!note.is_empty());
    }

    #[tokio::test]
    async fn model_failure_surfaces_as_analysis_unavailable() {
        let text_model = StubModel::failing("stub-text", "connection refused");
        let vision_model = StubModel::replying("stub-vision", "{}");
        let config = AnalysisConfig::builder()
            .render_page_image(false)
            .build()
            .expect("config");
        let service = AnalysisService::new(text_model, vision_model, config);

        let err = service.analyze(pdf_upload(&["hello"])).await.unwrap_err();
        assert_eq!(err.code(), "ANALYSIS_UNAVAILABLE");
    }

    #[tokio::test]
    async fn invalid_uploads_fail_before_any_model_call() {
        let (service, text_model) = service_with_reply("{}");

        let bad_name = UploadedDocument {
            filename: "malware.exe".into(),
            content_type: None,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(
            service.analyze(bad_name).await.unwrap_err().code(),
            "INVALID_FILE_TYPE"
        );

        let empty = UploadedDocument {
            filename: "empty.pdf".into(),
            content_type: None,
            bytes: Vec::new(),
        };
        assert_eq!(
            service.analyze(empty).await.unwrap_err().code(),
            "EMPTY_FILE"
        );

        let garbage = UploadedDocument {
            filename: "broken.pdf".into(),
            content_type: None,
            bytes: b"%PDF nope".to_vec(),
        };
        assert_eq!(
            service.analyze(garbage).await.unwrap_err().code(),
            "MALFORMED_DOCUMENT"
        );

        assert_eq!(text_model.requests.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn extract_only_returns_untruncated_text() {
        let long = "A very long paragraph of body text. ".repeat(300);
        let (service, text_model) = service_with_reply("{}");

        let report = service
            .extract_only(pdf_upload(&[long.as_str()]))
            .await
            .expect("extraction");

        assert_eq!(report.page_count, 1);
        assert_eq!(report.character_count, report.extracted_text.chars().count());
        assert!(report.extracted_text.chars().count() > 6000);
        assert_eq!(report.note, "Raw text extraction for debugging");
        // The analyzer is bypassed entirely.
        assert_eq!(text_model.requests.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn preview_is_capped_with_ellipsis() {
        let long = "An unusually verbose clause. ".repeat(100);
        let reply = r#"{"ok": true}"#;
        let text_model = StubModel::replying("stub-text", reply);
        let vision_model = StubModel::replying("stub-vision", reply);
        let config = AnalysisConfig::builder()
            .render_page_image(false)
            .preview_chars(50)
            .build()
            .expect("config");
        let service = AnalysisService::new(text_model, vision_model, config);

        let report = service
            .analyze(pdf_upload(&[long.as_str()]))
            .await
            .expect("analysis");
        let preview = report.metadata.raw_text_preview.expect("preview");
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 53);
    }
}
