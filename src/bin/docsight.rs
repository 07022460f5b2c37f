//! Server binary for docsight.
//!
//! A thin shim over the library crate: maps CLI flags (with environment
//! fallbacks) to an [`AnalysisConfig`], constructs the model providers once
//! at startup, and serves the Axum router.

use anyhow::{Context, Result};
use clap::Parser;
use docsight::{api, AnalysisConfig, AnalysisService};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docsight", version, about = "PDF document analysis service")]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "SERVER_PORT", default_value_t = 8000)]
    port: u16,

    /// Maximum characters of extracted text forwarded to the model.
    #[arg(long, env = "DOCSIGHT_EXTRACTION_BUDGET", default_value_t = 6000)]
    extraction_budget: usize,

    /// Model for text-only analysis.
    #[arg(long, env = "DOCSIGHT_TEXT_MODEL", default_value = "gpt-4.1-nano")]
    text_model: String,

    /// Vision-capable model used when a page image is attached.
    #[arg(long, env = "DOCSIGHT_VISION_MODEL", default_value = "gpt-4.1-mini")]
    vision_model: String,

    /// LLM provider name (e.g. "openai"). Auto-detected from API-key
    /// environment variables when omitted.
    #[arg(long, env = "DOCSIGHT_PROVIDER")]
    provider: Option<String>,

    /// Disable first-page rasterisation (text-only analysis).
    #[arg(long)]
    no_page_image: bool,

    /// Per-model-call timeout in seconds.
    #[arg(long, env = "DOCSIGHT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut builder = AnalysisConfig::builder()
        .extraction_budget(cli.extraction_budget)
        .text_model(cli.text_model)
        .vision_model(cli.vision_model)
        .render_page_image(!cli.no_page_image)
        .api_timeout_secs(cli.api_timeout);
    if let Some(provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    let config = builder.build().context("invalid configuration")?;

    let service =
        AnalysisService::from_env(config).context("failed to initialise analysis service")?;
    let app = api::create_router(Arc::new(service));

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, cli.port))
        .await
        .with_context(|| format!("failed to bind port {}", cli.port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", cli.port);
    axum::serve(listener, app).await?;
    Ok(())
}
