//! Renderer configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::consts::{
    DEFAULT_MAX_DIMENSION, DEFAULT_MERMAID_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_VIEWPORT_HEIGHT,
    DEFAULT_VIEWPORT_WIDTH,
};

/// Where the Mermaid IIFE bundle is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Local file, inlined into the page.
    Path(PathBuf),
    /// Remote bundle, loaded with a `<script src>` element.
    Url(String),
}

impl ScriptSource {
    /// Classify a configured value: `http://` and `https://` are URLs, anything else a path.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_owned())
        } else {
            Self::Path(PathBuf::from(value))
        }
    }
}

impl Default for ScriptSource {
    fn default() -> Self {
        Self::Url(DEFAULT_MERMAID_URL.to_owned())
    }
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Options forwarded to `mermaid.initialize`.
///
/// Unset fields are omitted so Mermaid's own defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MermaidOptions {
    /// Theme name (`default`, `dark`, `forest`, `neutral`, `base`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Security level (`strict`, `loose`, `antiscript`, `sandbox`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_level: Option<String>,
    /// CSS font family for labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

/// Configuration for [`Renderer`](crate::Renderer).
///
/// Every operation launches its own browser from this configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Mermaid bundle location.
    pub script: ScriptSource,
    /// Chrome/Chromium binary (default: auto-detect).
    pub chrome_executable: Option<PathBuf>,
    /// Whether Chrome runs with its sandbox (disable inside containers running as root).
    pub sandbox: bool,
    /// Timeout for a single DevTools request.
    pub request_timeout: Duration,
    /// Initial viewport width in CSS pixels.
    pub viewport_width: u32,
    /// Initial viewport height in CSS pixels.
    pub viewport_height: u32,
    /// Device pixel ratio used for PNG capture.
    pub device_scale_factor: f64,
    /// Largest viewport edge used when fitting a PNG capture.
    pub max_dimension: u32,
    /// Options for `mermaid.initialize`.
    pub mermaid: MermaidOptions,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            script: ScriptSource::default(),
            chrome_executable: None,
            sandbox: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            device_scale_factor: 1.0,
            max_dimension: DEFAULT_MAX_DIMENSION,
            mermaid: MermaidOptions::default(),
        }
    }
}

impl RendererConfig {
    /// Set the Mermaid bundle location.
    #[must_use]
    pub fn script(mut self, script: ScriptSource) -> Self {
        self.script = script;
        self
    }

    /// Set the Chrome binary.
    #[must_use]
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    /// Enable or disable the Chrome sandbox.
    #[must_use]
    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.sandbox = enabled;
        self
    }

    /// Set the DevTools request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the device pixel ratio for PNG capture.
    #[must_use]
    pub fn device_scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = factor;
        self
    }

    /// Set the Mermaid theme.
    #[must_use]
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.mermaid.theme = Some(theme.into());
        self
    }
}
