//! End-to-end conversion of one request.
//!
//! The flow is strictly linear: validate → stage → build args → invoke →
//! read result → release. Nothing is shared between requests except the
//! read-only [`ServiceConfig`] and the invoker.

use crate::config::ServiceConfig;
use crate::error::ConvertError;
use crate::pipeline::{args, invoke::RendererInvoker, workspace::WorkingArea};
use crate::request::ConversionRequest;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A rendered PDF, fully buffered in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedPdf {
    pub bytes: Vec<u8>,
    /// Wall-clock time from staging to result read, in milliseconds.
    pub duration_ms: u64,
}

/// Convert the request's HTML to a PDF.
///
/// # Errors
/// * [`ConvertError::InvalidRequest`] — `html` missing or empty; nothing
///   has touched the filesystem.
/// * [`ConvertError::Staging`] — the working area could not be prepared.
/// * [`ConvertError::LaunchFailed`] / [`ConvertError::RendererFailed`] /
///   [`ConvertError::RendererTimeout`] — the renderer did not succeed.
/// * [`ConvertError::ResultRead`] / [`ConvertError::NotAPdf`] — the renderer
///   exited 0 without leaving a PDF behind.
///
/// The working area is removed before this returns, on every path.
pub async fn convert(
    request: &ConversionRequest,
    config: &ServiceConfig,
    invoker: &dyn RendererInvoker,
) -> Result<ConvertedPdf, ConvertError> {
    let html = request.html()?;
    let start = Instant::now();

    let area = WorkingArea::create(config.work_root.as_deref())?;
    info!(
        "Starting conversion: {} bytes of HTML in {}",
        html.len(),
        area.path().display()
    );

    let result = render_in(&area, html, request, config, invoker).await;
    area.release().await;

    if let Err(e) = &result {
        warn!("Conversion failed after {}ms: {}", start.elapsed().as_millis(), e);
    }
    result.map(|bytes| {
        let duration_ms = start.elapsed().as_millis() as u64;
        info!("Conversion complete: {} bytes in {}ms", bytes.len(), duration_ms);
        ConvertedPdf { bytes, duration_ms }
    })
}

async fn render_in(
    area: &WorkingArea,
    html: &str,
    request: &ConversionRequest,
    config: &ServiceConfig,
    invoker: &dyn RendererInvoker,
) -> Result<Vec<u8>, ConvertError> {
    // ── Step 1: Stage input ──────────────────────────────────────────────
    let input = area.stage_html(html).await?;
    let output = area.output_path();

    // ── Step 2: Build arguments ──────────────────────────────────────────
    let argv = args::renderer_args(config, &input, &output, &request.options())?;
    debug!(?argv, "Renderer arguments");

    // ── Step 3: Run renderer ─────────────────────────────────────────────
    let run = invoker.invoke(&argv).await?;
    if !run.success() {
        return Err(ConvertError::RendererFailed {
            exit_code: run.exit_code,
            stdout: run.stdout,
            stderr: run.stderr,
        });
    }

    // ── Step 4: Read result ──────────────────────────────────────────────
    let bytes = area.read_output().await?;
    if !bytes.starts_with(b"%PDF") {
        return Err(ConvertError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(bytes)
}
