//! Pipeline stages for HTML-to-PDF conversion.
//!
//! Each submodule implements one step of a request's life. Keeping them
//! separate makes each one testable alone. The renderer can also be
//! swapped out without touching staging or argument construction.
//!
//! ## Data Flow
//!
//! ```text
//! workspace ──▶ args ──▶ invoke ──▶ workspace
//!  (stage HTML)  (argv)   (child +    (read PDF,
//!                          capture)    release dir)
//! ```
//!
//! 1. [`workspace`] — create the private temp directory and stage `input.html`
//! 2. [`args`]      — derive the renderer argument vector
//! 3. [`invoke`]    — run the renderer behind the [`invoke::RendererInvoker`] seam
//! 4. [`capture`]   — bounded accumulation of the child's output streams

pub mod args;
pub mod capture;
pub mod invoke;
pub mod workspace;
