//! Configuration for the analysis pipeline.
//!
//! Every knob lives in [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping them in one struct makes it trivial to
//! share a config across the server state, serialise it for logging, and diff
//! two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::error::AnalyzeError;
use serde::{Deserialize, Serialize};

/// Configuration for one analysis pipeline instance.
///
/// Built via [`AnalysisConfig::builder()`] or [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use docsight::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .extraction_budget(2000)
///     .text_model("gpt-4.1-nano")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum characters of extracted text forwarded to the model. Default: 6000.
    ///
    /// The hard cap keeps the request inside the model's context window on
    /// text-heavy documents. Lower it (1000–2000) when pairing with small
    /// context windows; the extractor truncates, it never errors on overflow.
    pub extraction_budget: usize,

    /// Characters of extracted text echoed back as `raw_text_preview`. Default: 500.
    pub preview_chars: usize,

    /// Rasterise page 1 and attach it to the model request. Default: true.
    ///
    /// Strictly advisory: a missing pdfium library, a corrupt page, or an
    /// encoding failure all downgrade the request to text-only.
    pub render_page_image: bool,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap independent of page size, so pdfium never allocates more
    /// than roughly `max_rendered_pixels²` bytes of pixels for an oversized
    /// page.
    pub max_rendered_pixels: u32,

    /// LLM provider name (e.g. "openai"). If None, auto-detected from the
    /// API-key environment variables at startup.
    pub provider_name: Option<String>,

    /// Model used for text-only requests. Default: "gpt-4.1-nano".
    pub text_model: String,

    /// Vision-capable model used when a page image is attached. Default: "gpt-4.1-mini".
    pub vision_model: String,

    /// Sampling temperature for the completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what the document actually
    /// says — exactly what you want for field extraction.
    pub temperature: f32,

    /// Maximum tokens the model may generate per reply. Default: 3000.
    pub max_tokens: usize,

    /// Per-model-call timeout in seconds. Default: 60.
    ///
    /// The single explicit timeout in the pipeline; there is no retry, so
    /// this bounds the whole analysis step.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extraction_budget: 6000,
            preview_chars: 500,
            render_page_image: true,
            max_rendered_pixels: 2000,
            provider_name: None,
            text_model: "gpt-4.1-nano".to_string(),
            vision_model: "gpt-4.1-mini".to_string(),
            temperature: 0.1,
            max_tokens: 3000,
            api_timeout_secs: 60,
            system_prompt: None,
        }
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn extraction_budget(mut self, chars: usize) -> Self {
        self.config.extraction_budget = chars;
        self
    }

    pub fn preview_chars(mut self, chars: usize) -> Self {
        self.config.preview_chars = chars;
        self
    }

    pub fn render_page_image(mut self, v: bool) -> Self {
        self.config.render_page_image = v;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.config.vision_model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalyzeError> {
        let c = &self.config;
        if c.extraction_budget == 0 {
            return Err(AnalyzeError::InvalidConfig(
                "extraction_budget must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalyzeError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.text_model.trim().is_empty() || c.vision_model.trim().is_empty() {
            return Err(AnalyzeError::InvalidConfig(
                "model identifiers must be non-empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::builder().build().expect("default config");
        assert_eq!(config.extraction_budget, 6000);
        assert_eq!(config.preview_chars, 500);
        assert!(config.render_page_image);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = AnalysisConfig::builder().extraction_budget(0).build();
        assert!(matches!(err, Err(AnalyzeError::InvalidConfig(_))));
    }

    #[test]
    fn temperature_is_clamped() {
        let config = AnalysisConfig::builder()
            .temperature(9.0)
            .build()
            .expect("config");
        assert!(config.temperature <= 2.0);
    }
}
