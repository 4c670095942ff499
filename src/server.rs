//! HTTP surface: `POST /convert` and `GET /health`.
//!
//! Handlers are thin. They parse the body, hand it to [`crate::convert`],
//! and map the outcome to either a PDF attachment or a JSON error envelope:
//!
//! ```json
//! { "error": "PDF conversion failed", "details": "…", "stdout": "…", "stderr": "…" }
//! ```
//!
//! Client errors (4xx) carry only `error`.

use crate::config::ServiceConfig;
use crate::convert::convert;
use crate::error::ConvertError;
use crate::pipeline::invoke::RendererInvoker;
use crate::request::ConversionRequest;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

/// Suggested file name for the downloaded PDF.
pub const ATTACHMENT_NAME: &str = "presentation.pdf";

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub invoker: Arc<dyn RendererInvoker>,
}

impl AppState {
    pub fn new(config: ServiceConfig, invoker: Arc<dyn RendererInvoker>) -> Self {
        Self {
            config: Arc::new(config),
            invoker,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl From<&ConvertError> for ErrorBody {
    fn from(err: &ConvertError) -> Self {
        let captured = err.captured_output();
        Self {
            error: err.summary(),
            details: err.details(),
            stdout: captured.map(|(out, _)| out.to_string()),
            stderr: captured.map(|(_, err)| err.to_string()),
        }
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        // Server-side failures are already logged by `convert`.
        let status = if self.is_client_error() {
            debug!("Rejected request: {}", self);
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

/// Map a body-extraction failure to the `{error}` envelope, keeping the
/// status axum chose (400 malformed JSON, 413 too large, 415 wrong type, …).
fn rejection_response(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let body = ErrorBody {
        error: rejection.body_text(),
        details: None,
        stdout: None,
        stderr: None,
    };
    debug!(%status, "Rejected request body: {}", body.error);
    (status, Json(body)).into_response()
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.body_limit;
    let cors = state.config.cors;

    let router = Router::new()
        .route("/convert", post(convert_handler))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// `POST /convert`
pub async fn convert_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    match convert(&request, &state.config, state.invoker.as_ref()).await {
        Ok(pdf) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={ATTACHMENT_NAME}"),
                ),
            ],
            pdf.bytes,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
