//! # docsight
//!
//! Analyze uploaded PDF documents into structured JSON with a hosted LLM.
//!
//! ## Why this crate?
//!
//! Document intake flows (invoices, contracts, statements) need the fields,
//! not the file. docsight accepts a PDF upload over HTTP, extracts its text
//! page by page, optionally lets a vision model look at the rendered first
//! page, and returns whatever structured JSON the model can read out of the
//! document — wrapped in a stable envelope so callers never see a bare crash.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Ingress  validate filename/content-type, reject empty uploads
//!  ├─ 2. Extract  per-page text via lopdf, "--- Page N ---" markers,
//!  │              truncated to the extraction budget
//!  ├─ 3. Render   best-effort raster of page 1 via pdfium (advisory)
//!  ├─ 4. Encode   PNG → base64 image attachment
//!  ├─ 5. Analyze  one chat completion; vision model iff an image is attached
//!  └─ 6. Shape    first-{ … last-} JSON span, raw-text fallback
//! ```
//!
//! Each request runs the pipeline start to finish in isolation: no shared
//! state, no retries, no caching.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsight::{api, AnalysisConfig, AnalysisService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = AnalysisConfig::default();
//!     let service = AnalysisService::from_env(config)?;
//!     let app = api::create_router(Arc::new(service));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! The library can also be driven without HTTP: construct an
//! [`AnalysisService`] (or any [`DocumentAnalysis`] implementation) and call
//! [`DocumentAnalysis::analyze`] with an [`UploadedDocument`] directly.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{AnalysisService, DocumentAnalysis};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::AnalyzeError;
pub use output::{AnalysisMetadata, AnalysisReport, ApiResponse, ExtractionReport};
pub use pipeline::extract::ExtractedText;
pub use pipeline::ingress::UploadedDocument;
pub use pipeline::llm::{LlmModel, ModelError, ModelRequest, SemanticAnalyzer, SemanticModel};
pub use pipeline::shape::Shaped;
