//! Wire types for a conversion request.
//!
//! Every field is optional at the serde level. A body without `html` must
//! produce the service's own "HTML content is required" answer instead of
//! a generic deserialisation error, so the check lives in
//! [`ConversionRequest::html`].

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /convert`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// The HTML document to render.
    #[serde(default)]
    pub html: Option<String>,

    /// Optional renderer options.
    #[serde(default)]
    pub options: Option<RenderOptions>,
}

impl ConversionRequest {
    /// Build a request from HTML alone.
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            options: None,
        }
    }

    /// Attach rendering options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The HTML payload, or [`ConvertError::InvalidRequest`] if it is absent or empty.
    pub fn html(&self) -> Result<&str, ConvertError> {
        match self.html.as_deref() {
            Some(html) if !html.is_empty() => Ok(html),
            _ => Err(ConvertError::InvalidRequest(
                "HTML content is required".to_string(),
            )),
        }
    }

    /// The rendering options, or the empty set.
    pub fn options(&self) -> RenderOptions {
        self.options.clone().unwrap_or_default()
    }
}

/// Options forwarded verbatim to the renderer.
///
/// Values are not validated here. The renderer is the authority on what a
/// page size or pause means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Page size token, e.g. `A4` or `1280x720`. Emitted as `--size=<value>`.
    #[serde(default)]
    pub size: Option<OptionValue>,

    /// Delay between slides. Emitted as `--pause=<value>`.
    #[serde(default)]
    pub pause: Option<OptionValue>,

    /// Navigation key names. Each is emitted as `--key=<name>`.
    #[serde(default)]
    pub keys: Vec<String>,
}

/// A string or a JSON number, rendered exactly as the client wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<u64> for OptionValue {
    fn from(n: u64) -> Self {
        OptionValue::Number(n.into())
    }
}
