//! HTTP surface for docsight.
//!
//! A compact Axum router with four endpoints:
//!
//! - `GET /` – health/status envelope (service name and version).
//! - `GET /api/test` – liveness probe, reporting whether the model credential
//!   was configured at startup.
//! - `POST /api/analyze-pdf` – multipart PDF upload; runs the full pipeline
//!   and answers with the [`ApiResponse`] envelope. Always a well-formed
//!   envelope at HTTP 200 — never a bare transport error.
//! - `POST /api/debug-extract` – same upload contract, raw extraction only.
//!   This endpoint is a debugging seam and *is* permitted to answer with
//!   transport-level status codes for faster diagnosis.
//!
//! The router is generic over [`DocumentAnalysis`], so tests drive it against
//! a stub service with `tower::ServiceExt::oneshot`.

use crate::analyze::DocumentAnalysis;
use crate::error::AnalyzeError;
use crate::output::{AnalysisReport, ApiResponse, ExtractionReport};
use crate::pipeline::ingress::{self, UploadedDocument};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Upper bound on an uploaded file (multipart body included).
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the HTTP router exposing the analysis API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentAnalysis + 'static,
{
    // The browser frontend runs on another origin and the API carries no
    // credentials, hence the wildcard policy.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/api/test", get(probe::<S>))
        .route("/api/analyze-pdf", post(analyze_pdf::<S>))
        .route("/api/debug-extract", post(debug_extract::<S>))
        // Axum's default 2 MB body cap is too small for scanned PDFs.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Health/status envelope for the root path.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe reporting credential presence.
async fn probe<S>(State(service): State<Arc<S>>) -> Json<serde_json::Value>
where
    S: DocumentAnalysis,
{
    Json(json!({
        "status": "working",
        "message": "Test endpoint working",
        "credential_configured": service.credential_configured(),
    }))
}

/// Run the full analysis pipeline on an uploaded PDF.
async fn analyze_pdf<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Json<ApiResponse<AnalysisReport>>
where
    S: DocumentAnalysis,
{
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => {
            warn!(error = %err, code = err.code(), "Rejected upload");
            return Json(ApiResponse::failure(&err));
        }
    };

    match service.analyze(upload).await {
        Ok(report) => Json(ApiResponse::success(report)),
        Err(err) => {
            warn!(error = %err, code = err.code(), "Analysis request failed");
            Json(ApiResponse::failure(&err))
        }
    }
}

/// Raw extraction without the analyzer — the debugging seam.
async fn debug_extract<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ExtractionReport>>, AppError>
where
    S: DocumentAnalysis,
{
    let upload = read_upload(multipart).await?;
    let report = service.extract_only(upload).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Pull the uploaded file out of the multipart body.
///
/// The file-type check runs on the part's headers *before* its bytes are
/// read, and the emptiness check runs before any parsing — both orderings
/// are part of the ingress contract.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedDocument, AnalyzeError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AnalyzeError::UploadUnreadable {
            detail: e.to_string(),
        })?
        .ok_or_else(|| AnalyzeError::UploadUnreadable {
            detail: "no file field in upload".to_string(),
        })?;

    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(|s| s.to_string());
    ingress::validate_file_type(&filename, content_type.as_deref())?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AnalyzeError::UploadUnreadable {
            detail: e.to_string(),
        })?;
    ingress::validate_not_empty(&bytes)?;

    Ok(UploadedDocument {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// Transport-level error wrapper for the debug endpoint only.
pub struct AppError(AnalyzeError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.0.to_string()).into_response()
    }
}

impl From<AnalyzeError> for AppError {
    fn from(inner: AnalyzeError) -> Self {
        Self(inner)
    }
}
