//! # deck2pdf
//!
//! Convert HTML slide decks to PDF over HTTP by delegating the rendering to
//! an external headless-browser capture tool (decktape by default).
//!
//! ## Why shell out?
//!
//! Paginating a slide deck faithfully means running its JavaScript,
//! stepping through every slide and printing each one. That is a browser's
//! job. This crate does the plumbing around it. It stages the HTML in a
//! private directory, runs the renderer with the right arguments and
//! supervises it. Then it returns the PDF and cleans up, every time.
//!
//! ## Request Lifecycle
//!
//! ```text
//! POST /convert { html, options }
//!  │
//!  ├─ 1. Validate  reject empty HTML before touching the filesystem
//!  ├─ 2. Stage     private temp dir + input.html
//!  ├─ 3. Args      --chrome-path, --chrome-arg…, --size/--pause/--key, generic <uri> <out>
//!  ├─ 4. Invoke    child process, stdout/stderr captured (capped)
//!  ├─ 5. Respond   application/pdf attachment, or JSON error with diagnostics
//!  └─ 6. Release   working directory removed on every path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deck2pdf::{convert, ConversionRequest, ProcessInvoker, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::default();
//!     let invoker = ProcessInvoker::from_config(&config);
//!     let request = ConversionRequest::new("<section><h1>Hello</h1></section>");
//!     let pdf = convert(&request, &config, &invoker).await?;
//!     std::fs::write("presentation.pdf", &pdf.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deck2pdf` server binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use convert::{convert, ConvertedPdf};
pub use error::ConvertError;
pub use pipeline::invoke::{ProcessInvoker, RendererInvoker, RendererOutput};
pub use request::{ConversionRequest, OptionValue, RenderOptions};
pub use server::{router, AppState};
