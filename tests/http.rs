//! HTTP contract tests, driven in-process through `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use deck2pdf::{router, AppState, RendererInvoker, ServiceConfig};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn app(config: ServiceConfig, invoker: Arc<dyn RendererInvoker>) -> Router {
    router(AppState::new(config, invoker))
}

fn post_json(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/convert")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn health_of(app: Router) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

fn fixture_app(root: &Path) -> (Router, Arc<FixtureRenderer>) {
    let renderer = Arc::new(FixtureRenderer::default());
    (app(config_in(root), renderer.clone()), renderer)
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_works() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = fixture_app(root.path());

    let (status, body) = health_of(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn health_survives_failed_conversions() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        config_in(root.path()),
        Arc::new(FailingRenderer::new(1, "", "boom")),
    );

    let response = app
        .clone()
        .oneshot(post_json(&json!({ "html": "<p>x</p>" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = health_of(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ── Convert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_returns_pdf_attachment() {
    let root = tempfile::tempdir().unwrap();
    let (app, renderer) = fixture_app(root.path());

    let response = app
        .oneshot(post_json(&json!({
            "html": "<section>Slide</section>",
            "options": { "size": "A4", "pause": 2 }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=presentation.pdf"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let args = renderer.last_args();
    assert!(args.contains(&"--size=A4".to_string()));
    assert!(args.contains(&"--pause=2".to_string()));
    assert!(!renderer.dirs()[0].exists());
}

#[tokio::test]
async fn missing_html_is_bad_request() {
    let root = tempfile::tempdir().unwrap();
    let (app, renderer) = fixture_app(root.path());

    for body in [json!({}), json!({ "html": "" }), json!({ "options": { "size": "A4" } })] {
        let response = app.clone().oneshot(post_json(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(
            json_body(response).await,
            json!({ "error": "HTML content is required" })
        );
    }
    assert!(renderer.dirs().is_empty());
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = fixture_app(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/convert")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"html\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn renderer_failure_is_structured_500() {
    let root = tempfile::tempdir().unwrap();
    let renderer = Arc::new(FailingRenderer::new(
        1,
        "Loading page file:///tmp/input.html ...",
        "TimeoutError: Navigation timeout of 30000 ms exceeded",
    ));
    let app = app(config_in(root.path()), renderer.clone());

    let response = app
        .oneshot(post_json(&json!({ "html": "<p>x</p>" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "PDF conversion failed");
    assert_eq!(
        body["details"],
        "TimeoutError: Navigation timeout of 30000 ms exceeded"
    );
    assert_eq!(body["stdout"], "Loading page file:///tmp/input.html ...");
    assert_eq!(
        body["stderr"],
        "TimeoutError: Navigation timeout of 30000 ms exceeded"
    );
    assert!(!renderer.dirs.lock().unwrap()[0].exists());
}

#[tokio::test]
async fn renderer_failure_falls_back_to_stdout() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        config_in(root.path()),
        Arc::new(FailingRenderer::new(2, "Unable to open file", "")),
    );

    let response = app
        .oneshot(post_json(&json!({ "html": "<p>x</p>" })))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["details"], "Unable to open file");
    assert_eq!(body["stderr"], "");
}

#[tokio::test]
async fn launch_failure_has_details_without_streams() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        config_in(root.path()),
        Arc::new(deck2pdf::ProcessInvoker::new("/nonexistent/decktape")),
    );

    let response = app
        .oneshot(post_json(&json!({ "html": "<p>x</p>" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to start renderer");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("/nonexistent/decktape"));
    assert!(body.get("stdout").is_none());
    assert!(body.get("stderr").is_none());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .work_root(root.path())
        .body_limit(64)
        .build()
        .unwrap();
    let renderer = Arc::new(FixtureRenderer::default());
    let app = app(config, renderer.clone());

    let html = "<p>".repeat(100);
    let response = app
        .oneshot(post_json(&json!({ "html": html })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert!(renderer.dirs().is_empty());
}

#[tokio::test]
async fn wrong_content_type_is_unsupported_media_type() {
    let root = tempfile::tempdir().unwrap();
    let (app, renderer) = fixture_app(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/convert")
                .header(header::CONTENT_TYPE, "text/html")
                .body(Body::from("<section>Slide</section>"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(json_body(response).await["error"].is_string());
    assert!(renderer.dirs().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn hung_renderer_is_timed_out_500() {
    let bin = tempfile::tempdir().unwrap();
    let script = shell_renderer(
        bin.path(),
        "hung.sh",
        "echo 'Loading page'\necho 'Waiting for slides' >&2\nsleep 30",
    );
    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .renderer(&script)
        .work_root(root.path())
        .render_timeout_secs(1)
        .build()
        .unwrap();
    let invoker = Arc::new(deck2pdf::ProcessInvoker::from_config(&config));
    let app = app(config, invoker);

    let started = std::time::Instant::now();
    let response = app
        .oneshot(post_json(&json!({ "html": "<p>x</p>" })))
        .await
        .unwrap();
    assert!(
        started.elapsed() < std::time::Duration::from_secs(5),
        "took {:?}",
        started.elapsed()
    );

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "PDF conversion timed out");
    assert_eq!(body["details"], "Waiting for slides\n");
    assert_eq!(body["stdout"], "Loading page\n");
    assert_eq!(body["stderr"], "Waiting for slides\n");
    assert_eq!(entries(root.path()), 0);
}

// ── CORS variant ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cors_preflight_is_answered_when_enabled() {
    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .work_root(root.path())
        .cors(true)
        .build()
        .unwrap();
    let app = app(config, Arc::new(FixtureRenderer::default()));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/convert")
                .header(header::ORIGIN, "https://slides.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn no_cors_headers_by_default() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = fixture_app(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://slides.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
