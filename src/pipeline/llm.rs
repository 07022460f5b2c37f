//! Model interaction: build the chat request and drive one completion call.
//!
//! This module is intentionally thin — all prompt text lives in
//! [`crate::prompts`] so it can change without touching transport or
//! error-handling logic here.
//!
//! ## Injection seam
//!
//! The analyzer never talks to a process-global client. It holds
//! [`SemanticModel`] trait objects, constructed once at startup and passed
//! in explicitly, so tests can substitute a canned implementation and the
//! production path can wrap any `edgequake-llm` provider.
//!
//! ## No retries
//!
//! Each analysis is a single best-effort call. A transient failure surfaces
//! immediately as [`AnalyzeError::AnalysisUnavailable`] with the cause
//! recorded; the only policy applied is an explicit per-call timeout.

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::prompts;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info};

/// One assembled model request: instruction, document text, optional image.
#[derive(Clone)]
pub struct ModelRequest {
    pub system: String,
    pub user: String,
    pub image: Option<ImageData>,
}

/// Failure of a single model call.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// A chat-style completion backend.
///
/// Implemented by [`LlmModel`] for production and by test stubs.
#[async_trait]
pub trait SemanticModel: Send + Sync {
    /// Submit the request and return the model's free-text reply.
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError>;

    /// Identifier reported in response metadata (e.g. "gpt-4.1-nano").
    fn model_id(&self) -> &str;
}

/// Production [`SemanticModel`] wrapping an `edgequake-llm` provider.
pub struct LlmModel {
    provider: Arc<dyn LLMProvider>,
    model_id: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl LlmModel {
    /// Wrap a pre-constructed provider (useful when the caller needs custom
    /// middleware or shares a provider across services).
    pub fn new(provider: Arc<dyn LLMProvider>, model_id: impl Into<String>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Construct a provider for `model_id` from the named registry entry,
    /// reading the matching API key from the environment.
    ///
    /// A missing or empty key fails here, at startup — credential presence is
    /// a configuration concern, never a per-request error.
    pub fn from_registry(
        provider_name: &str,
        model_id: &str,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalyzeError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model_id).map_err(
            |e| AnalyzeError::ProviderNotConfigured {
                hint: format!("provider '{provider_name}': {e}"),
            },
        )?;
        Ok(Self::new(provider, model_id, config))
    }
}

#[async_trait]
impl SemanticModel for LlmModel {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let mut messages = vec![ChatMessage::system(request.system.as_str())];
        match &request.image {
            Some(image) => messages.push(ChatMessage::user_with_images(
                request.user.as_str(),
                vec![image.clone()],
            )),
            None => messages.push(ChatMessage::user(request.user.as_str())),
        }

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let started = Instant::now();
        let response = timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| {
                ModelError(format!(
                    "model call timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ModelError(e.to_string()))?;

        debug!(
            model = %self.model_id,
            prompt_tokens = response.prompt_tokens,
            completion_tokens = response.completion_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model call completed"
        );

        Ok(response.content)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Routes each request to the text-only or vision-capable model.
///
/// Purely local routing: image present → vision model, otherwise text model.
/// There is no fallback between models — if the chosen one fails, the
/// failure surfaces to the caller.
pub struct SemanticAnalyzer {
    text_model: Arc<dyn SemanticModel>,
    vision_model: Arc<dyn SemanticModel>,
}

impl SemanticAnalyzer {
    pub fn new(text_model: Arc<dyn SemanticModel>, vision_model: Arc<dyn SemanticModel>) -> Self {
        Self {
            text_model,
            vision_model,
        }
    }

    /// Run one analysis call; returns the reply and the id of the model used.
    pub async fn analyze(
        &self,
        extracted_text: &str,
        image: Option<ImageData>,
        system_prompt: &str,
    ) -> Result<(String, String), AnalyzeError> {
        let model = if image.is_some() {
            &self.vision_model
        } else {
            &self.text_model
        };
        info!(
            model = model.model_id(),
            with_image = image.is_some(),
            "Requesting document analysis"
        );

        let request = ModelRequest {
            system: system_prompt.to_string(),
            user: prompts::document_user_message(extracted_text),
            image,
        };

        let reply = model
            .complete(&request)
            .await
            .map_err(|e| AnalyzeError::AnalysisUnavailable {
                detail: e.to_string(),
            })?;
        Ok((reply, model.model_id().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
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

    fn png_stub() -> ImageData {
        ImageData::new("aGVsbG8=".to_string(), "image/png")
    }

    #[tokio::test]
    async fn text_only_requests_route_to_the_text_model() {
        let text = StubModel::replying("text-model", "{}");
        let vision = StubModel::replying("vision-model", "{}");
        let analyzer = SemanticAnalyzer::new(text.clone(), vision.clone());

        let (_, model_id) = analyzer
            .analyze("--- Page 1 ---\nhello\n", None, "extract")
            .await
            .expect("analysis");

        assert_eq!(model_id, "text-model");
        assert_eq!(text.request_count(), 1);
        assert_eq!(vision.request_count(), 0);
    }

    #[tokio::test]
    async fn image_requests_route_to_the_vision_model() {
        let text = StubModel::replying("text-model", "{}");
        let vision = StubModel::replying("vision-model", "{}");
        let analyzer = SemanticAnalyzer::new(text.clone(), vision.clone());

        let (_, model_id) = analyzer
            .analyze("--- Page 1 ---\nhello\n", Some(png_stub()), "extract")
            .await
            .expect("analysis");

        assert_eq!(model_id, "vision-model");
        assert_eq!(text.request_count(), 0);
        assert_eq!(vision.request_count(), 1);
        let request = vision.requests.lock().unwrap()[0].clone();
        assert!(request.image.is_some());
        assert!(request.user.contains("hello"));
    }

    #[tokio::test]
    async fn model_failure_maps_to_analysis_unavailable() {
        let text = StubModel::failing("text-model", "HTTP 503 from provider");
        let vision = StubModel::replying("vision-model", "{}");
        let analyzer = SemanticAnalyzer::new(text, vision);

        let err = analyzer
            .analyze("some text", None, "extract")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ANALYSIS_UNAVAILABLE");
        assert!(err.to_string().contains("503"));
    }
}
