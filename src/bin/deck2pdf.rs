//! Server binary for deck2pdf.
//!
//! A thin shim over the library crate. It maps CLI flags and environment
//! variables to `ServiceConfig`, then serves the router until
//! Ctrl-C / SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use deck2pdf::{router, AppState, ProcessInvoker, ServiceConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port with decktape and Chromium from PATH
  deck2pdf

  # Run decktape through node, with an explicit browser
  deck2pdf --renderer node --renderer-script ./node_modules/decktape/decktape.js \
           --chrome-path /usr/bin/google-chrome

  # Convert a deck
  curl -X POST http://localhost:3000/convert \
       -H 'Content-Type: application/json' \
       -d '{"html": "<section>Hello</section>", "options": {"size": "1280x720", "pause": 500}}' \
       --output presentation.pdf

ENVIRONMENT VARIABLES:
  PORT                       Listening port (default 3000)
  HOST                       Listening address (default 0.0.0.0)
  DECKTAPE_PATH              Renderer program (default: decktape on PATH)
  DECKTAPE_SCRIPT            Renderer entry point passed as the first argument
  CHROME_PATH                Browser executable handed to the renderer
  CHROME_ARGS                Comma-separated browser flags
  DECKTAPE_NAVIGATION_KEYS   Append fixed ArrowRight/Space navigation keys
  DECK2PDF_CORS              Permissive CORS on every response
  DECK2PDF_RENDER_TIMEOUT    Kill the renderer after N seconds (default: never)
  RUST_LOG                   Log filter, overrides --verbose
"#;

/// Serve an HTML-to-PDF conversion endpoint backed by a headless-browser capture tool.
#[derive(Parser, Debug)]
#[command(
    name = "deck2pdf",
    version,
    about = "HTTP service converting HTML slide decks to PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Renderer program (name on PATH or absolute path).
    #[arg(long, env = "DECKTAPE_PATH", default_value = deck2pdf::config::DEFAULT_RENDERER)]
    renderer: PathBuf,

    /// Renderer entry point, passed as the first argument (e.g. decktape.js under node).
    #[arg(long, env = "DECKTAPE_SCRIPT")]
    renderer_script: Option<PathBuf>,

    /// Browser executable handed to the renderer.
    #[arg(long, env = "CHROME_PATH", default_value = deck2pdf::config::DEFAULT_BROWSER_PATH)]
    chrome_path: PathBuf,

    /// Comma-separated browser launch flags.
    #[arg(long, env = "CHROME_ARGS", allow_hyphen_values = true,
          default_value = deck2pdf::config::DEFAULT_BROWSER_ARGS)]
    chrome_args: String,

    /// Append fixed navigation keys (ArrowRight, Space) to every invocation.
    #[arg(long, env = "DECKTAPE_NAVIGATION_KEYS")]
    navigation_keys: bool,

    /// Add permissive CORS headers and answer pre-flight requests.
    #[arg(long, env = "DECK2PDF_CORS")]
    cors: bool,

    /// Kill a renderer that runs longer than this many seconds.
    #[arg(long, env = "DECK2PDF_RENDER_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    render_timeout: Option<u64>,

    /// Bytes of renderer stdout/stderr kept per stream.
    #[arg(long, env = "DECK2PDF_MAX_OUTPUT", default_value_t = 1024 * 1024)]
    max_output: usize,

    /// Maximum request body size in bytes.
    #[arg(long, env = "DECK2PDF_BODY_LIMIT", default_value_t = 50 * 1024 * 1024)]
    body_limit: usize,

    /// Directory under which per-request working areas are created.
    #[arg(long, env = "DECK2PDF_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DECK2PDF_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let invoker = ProcessInvoker::from_config(&config);
    info!(
        renderer = %invoker.program().display(),
        browser = %config.browser_path.display(),
        navigation_keys = config.navigation_keys,
        cors = config.cors,
        timeout_secs = ?config.render_timeout_secs,
        "Configuration loaded"
    );

    let app = router(AppState::new(config, Arc::new(invoker)));

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", cli.host, cli.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Map CLI args to `ServiceConfig`.
fn build_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .renderer(&cli.renderer)
        .browser_path(&cli.chrome_path)
        .browser_args_csv(&cli.chrome_args)
        .navigation_keys(cli.navigation_keys)
        .cors(cli.cors)
        .max_captured_output(cli.max_output)
        .body_limit(cli.body_limit);

    if let Some(ref script) = cli.renderer_script {
        builder = builder.renderer_script(script);
    }
    if let Some(secs) = cli.render_timeout {
        builder = builder.render_timeout_secs(secs);
    }
    if let Some(ref dir) = cli.work_dir {
        builder = builder.work_root(dir);
    }

    builder.build().context("Invalid configuration")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
