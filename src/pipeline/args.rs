//! Renderer argument construction.
//!
//! A pure function of the configuration, the working-area paths and the
//! request options. The resulting vector has this shape:
//!
//! ```text
//! [script] --chrome-path=<browser> --chrome-arg=<flag>… [--size=…] [--pause=…] [--key=…]…
//!          generic file:///…/input.html /…/output.pdf
//! ```
//!
//! The three trailing positionals (mode, input, output) always appear in
//! that order and always last. Flags go before them.

use crate::config::{ServiceConfig, FIXED_NAVIGATION_KEYS};
use crate::error::ConvertError;
use crate::request::RenderOptions;
use std::path::Path;
use url::Url;

/// Renderer mode token selecting generic (non framework-specific) capture.
pub const RENDERER_MODE: &str = "generic";

/// Build the full argument vector for one renderer invocation.
///
/// `input` must be absolute; it is encoded as a `file://` URI.
pub fn renderer_args(
    config: &ServiceConfig,
    input: &Path,
    output: &Path,
    options: &RenderOptions,
) -> Result<Vec<String>, ConvertError> {
    let input_uri = Url::from_file_path(input).map_err(|()| {
        ConvertError::Internal(format!(
            "input path is not absolute: {}",
            input.display()
        ))
    })?;

    let mut args = Vec::with_capacity(8 + config.browser_args.len() + options.keys.len());

    if let Some(script) = &config.renderer_script {
        args.push(script.display().to_string());
    }
    args.push(format!("--chrome-path={}", config.browser_path.display()));
    args.extend(
        config
            .browser_args
            .iter()
            .map(|flag| format!("--chrome-arg={flag}")),
    );

    if let Some(size) = &options.size {
        args.push(format!("--size={size}"));
    }
    if let Some(pause) = &options.pause {
        args.push(format!("--pause={pause}"));
    }
    args.extend(options.keys.iter().map(|key| format!("--key={key}")));
    if config.navigation_keys {
        args.extend(FIXED_NAVIGATION_KEYS.iter().map(|key| format!("--key={key}")));
    }

    args.push(RENDERER_MODE.to_string());
    args.push(input_uri.to_string());
    args.push(output.display().to_string());
    Ok(args)
}
