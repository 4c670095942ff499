//! Configuration for the conversion service.
//!
//! Everything the handler needs beyond the request itself lives in
//! [`ServiceConfig`]. It is built once at startup, usually from environment
//! variables parsed by the binary, and then shared read-only behind an
//! `Arc`. No conversion ever reads the environment on its own.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Renderer program used when none is configured.
pub const DEFAULT_RENDERER: &str = "decktape";

/// Browser executable used when none is configured.
pub const DEFAULT_BROWSER_PATH: &str = "/usr/bin/chromium-browser";

/// Browser flags used when none are configured.
pub const DEFAULT_BROWSER_ARGS: &str = "--no-sandbox,--disable-gpu";

/// Keys pressed to advance slides when [`ServiceConfig::navigation_keys`] is on.
pub const FIXED_NAVIGATION_KEYS: &[&str] = &["ArrowRight", "Space"];

/// Process-wide configuration of the conversion service.
///
/// Built via [`ServiceConfig::builder()`] or using
/// [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use deck2pdf::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .browser_path("/usr/bin/google-chrome")
///     .browser_args_csv("--no-sandbox, --disable-dev-shm-usage")
///     .render_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.browser_args.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Renderer program to execute. Default: `decktape`.
    ///
    /// Bare names are looked up on `PATH` when the invoker is created.
    pub renderer: PathBuf,

    /// Renderer entry point passed as the very first argument. Default: none.
    ///
    /// Set this when `renderer` is an interpreter (e.g. `node`) and the
    /// capture tool is a script next to the service.
    pub renderer_script: Option<PathBuf>,

    /// Browser executable handed to the renderer. Default: `/usr/bin/chromium-browser`.
    pub browser_path: PathBuf,

    /// Browser launch flags, each forwarded as `--chrome-arg=<flag>`.
    /// Default: `--no-sandbox`, `--disable-gpu`.
    pub browser_args: Vec<String>,

    /// Append [`FIXED_NAVIGATION_KEYS`] to every invocation. Default: false.
    pub navigation_keys: bool,

    /// Add permissive CORS headers and answer pre-flight requests. Default: false.
    pub cors: bool,

    /// Kill the renderer after this many seconds. Default: none (wait forever).
    pub render_timeout_secs: Option<u64>,

    /// Bytes kept per captured output stream. Default: 1 MiB.
    ///
    /// Only the most recent bytes are kept, so a chatty renderer cannot grow
    /// the request's memory without bound. The tail is where the error is.
    pub max_captured_output: usize,

    /// Maximum accepted request body in bytes. Default: 50 MiB.
    pub body_limit: usize,

    /// Directory under which working areas are created. Default: the system temp dir.
    pub work_root: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            renderer: PathBuf::from(DEFAULT_RENDERER),
            renderer_script: None,
            browser_path: PathBuf::from(DEFAULT_BROWSER_PATH),
            browser_args: parse_browser_args(DEFAULT_BROWSER_ARGS),
            navigation_keys: false,
            cors: false,
            render_timeout_secs: None,
            max_captured_output: 1024 * 1024,
            body_limit: 50 * 1024 * 1024,
            work_root: None,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Split a comma-separated flag list, trimming entries and dropping blanks.
pub fn parse_browser_args(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|flag| !flag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn renderer(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.renderer = program.into();
        self
    }

    pub fn renderer_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.config.renderer_script = Some(script.into());
        self
    }

    pub fn browser_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_path = path.into();
        self
    }

    pub fn browser_args(mut self, args: Vec<String>) -> Self {
        self.config.browser_args = args;
        self
    }

    /// Set browser flags from a comma-separated list, as found in `CHROME_ARGS`.
    pub fn browser_args_csv(mut self, csv: &str) -> Self {
        self.config.browser_args = parse_browser_args(csv);
        self
    }

    pub fn navigation_keys(mut self, v: bool) -> Self {
        self.config.navigation_keys = v;
        self
    }

    pub fn cors(mut self, v: bool) -> Self {
        self.config.cors = v;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = Some(secs);
        self
    }

    pub fn max_captured_output(mut self, bytes: usize) -> Self {
        self.config.max_captured_output = bytes;
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.config.body_limit = bytes;
        self
    }

    pub fn work_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_root = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ConvertError> {
        let c = &self.config;
        if c.renderer.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "renderer program must not be empty".into(),
            ));
        }
        if c.browser_path.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "browser path must not be empty".into(),
            ));
        }
        if c.max_captured_output < 1024 {
            return Err(ConvertError::InvalidConfig(format!(
                "captured output cap must be ≥ 1024 bytes, got {}",
                c.max_captured_output
            )));
        }
        if c.render_timeout_secs == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "render timeout must be ≥ 1 second".into(),
            ));
        }
        if c.body_limit == 0 {
            return Err(ConvertError::InvalidConfig(
                "body limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
