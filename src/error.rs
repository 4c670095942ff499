//! Error types for the deck2pdf library.
//!
//! A single enum, [`ConvertError`], covers every way a conversion can end
//! without a PDF. The variants follow the order in which a request moves
//! through the pipeline:
//!
//! * **Client errors** — [`ConvertError::InvalidRequest`] is detected before
//!   any directory or process exists. It maps to HTTP 400.
//! * **Staging** — the working area could not be created or written.
//! * **Renderer** — the child process would not start, exited non-zero,
//!   or ran past the configured timeout. These carry the captured output.
//! * **Result** — the renderer claimed success but left nothing usable.
//!
//! Failing to delete the working area is *not* an error here. By then the
//! caller already has its answer, so cleanup failures are only logged.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the deck2pdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// The request body is missing, malformed, or has no HTML.
    #[error("{0}")]
    InvalidRequest(String),

    // ── Staging errors ────────────────────────────────────────────────────
    /// The per-request working area could not be created or written.
    #[error("Failed to stage conversion input at '{path}': {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The renderer executable could not be started at all.
    #[error("Failed to start renderer '{program}': {source}")]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran and exited unsuccessfully.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    #[error("Renderer exited with {}", describe_exit(*.exit_code))]
    RendererFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The renderer was killed after exceeding the configured timeout.
    #[error("Renderer timed out after {secs}s and was killed")]
    RendererTimeout {
        secs: u64,
        stdout: String,
        stderr: String,
    },

    // ── Result errors ─────────────────────────────────────────────────────
    /// Zero exit code, but the output file is missing or unreadable.
    #[error("Failed to read renderer output '{path}': {source}")]
    ResultRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zero exit code, but the output does not start with `%PDF`.
    #[error("Renderer output is not a PDF document (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ConvertError {
    /// `true` when the caller sent a bad request rather than the server failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ConvertError::InvalidRequest(_))
    }

    /// Short, stable message suitable for the `error` field of a response.
    pub fn summary(&self) -> String {
        match self {
            ConvertError::InvalidRequest(msg) => msg.clone(),
            ConvertError::Staging { .. } => "Failed to prepare conversion".to_string(),
            ConvertError::LaunchFailed { .. } => "Failed to start renderer".to_string(),
            ConvertError::RendererFailed { .. } => "PDF conversion failed".to_string(),
            ConvertError::RendererTimeout { .. } => "PDF conversion timed out".to_string(),
            ConvertError::ResultRead { .. } | ConvertError::NotAPdf { .. } => {
                "Failed to read generated PDF".to_string()
            }
            ConvertError::InvalidConfig(_) | ConvertError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Diagnostic text for the `details` field of a response.
    ///
    /// For renderer failures this is the captured error stream, falling back
    /// to the output stream when the renderer wrote nothing to stderr.
    pub fn details(&self) -> Option<String> {
        match self {
            ConvertError::InvalidRequest(_) => None,
            ConvertError::RendererFailed { stdout, stderr, .. }
            | ConvertError::RendererTimeout { stdout, stderr, .. } => {
                if stderr.is_empty() {
                    if stdout.is_empty() {
                        Some(self.to_string())
                    } else {
                        Some(stdout.clone())
                    }
                } else {
                    Some(stderr.clone())
                }
            }
            other => Some(other.to_string()),
        }
    }

    /// Raw `(stdout, stderr)` captured from the renderer, if any.
    pub fn captured_output(&self) -> Option<(&str, &str)> {
        match self {
            ConvertError::RendererFailed { stdout, stderr, .. }
            | ConvertError::RendererTimeout { stdout, stderr, .. } => {
                Some((stdout.as_str(), stderr.as_str()))
            }
            _ => None,
        }
    }
}
