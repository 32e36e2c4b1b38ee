//! Error types for diagram parsing and rendering.

use std::path::PathBuf;

use chromiumoxide::error::CdpError;

/// Error from a parse or render operation.
///
/// Variants fall into three groups: session acquisition (`Launch`,
/// `Navigation`, `ScriptInjection`, `Browser`), page-context evaluation
/// (`Evaluation`, `Decode`, `EmptyRender`, `InvalidPng`) and output
/// persistence (`Io`).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DiagramError {
    /// Browser process could not be configured or started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// DevTools transport error (closed connection, timeout, protocol error).
    #[error("browser error: {0}")]
    Browser(#[from] CdpError),

    /// Bootstrap document could not be loaded.
    #[error("failed to load bootstrap page: {0}")]
    Navigation(String),

    /// Mermaid bundle could not be read or did not define `globalThis.mermaid`.
    #[error("failed to inject mermaid from {source_ref}: {message}")]
    ScriptInjection {
        /// Path or URL of the bundle.
        source_ref: String,
        /// What went wrong.
        message: String,
    },

    /// Page-context callback threw or rejected (e.g. a Mermaid syntax error).
    #[error("evaluation failed: {message}")]
    Evaluation {
        /// Exception text as reported by the page.
        message: String,
    },

    /// Callback result did not have the expected shape.
    #[error("unexpected evaluation result: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rendered diagram has a zero-area bounding box.
    #[error("rendered diagram is empty ({width}x{height})")]
    EmptyRender {
        /// Measured width in CSS pixels.
        width: u32,
        /// Measured height in CSS pixels.
        height: u32,
    },

    /// Screenshot bytes are not a PNG image.
    #[error("invalid PNG data")]
    InvalidPng,

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl DiagramError {
    /// Create an I/O error with path context.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an evaluation error from a message.
    pub(crate) fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }
}

/// Convert a DevTools error, lifting page exceptions into [`DiagramError::Evaluation`].
///
/// `chromiumoxide` reports a thrown exception or rejected promise as
/// `CdpError::JavascriptException`; everything else stays a transport error.
pub(crate) fn from_cdp(err: CdpError) -> DiagramError {
    match err {
        CdpError::JavascriptException(details) => {
            // `description` carries "Error: <message>" plus the stack; `text` is just "Uncaught".
            let message = details
                .exception
                .as_ref()
                .and_then(|exception| exception.description.clone())
                .unwrap_or_else(|| details.text.clone());
            DiagramError::Evaluation { message }
        }
        other => DiagramError::Browser(other),
    }
}

/// Result alias for diagram operations.
pub type Result<T, E = DiagramError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_includes_path() {
        let err = DiagramError::io(
            "/tmp/out.svg",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on /tmp/out.svg: denied");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_evaluation_error_display() {
        let err = DiagramError::evaluation("Parse error on line 2");
        assert_eq!(err.to_string(), "evaluation failed: Parse error on line 2");
    }

    #[test]
    fn test_empty_render_display() {
        let err = DiagramError::EmptyRender {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "rendered diagram is empty (0x12)");
    }

    #[test]
    fn test_decode_error_display_includes_cause() {
        let cause = serde_json::from_str::<Vec<u32>>("{}").unwrap_err();
        let expected = format!("unexpected evaluation result: {cause}");

        let err = DiagramError::from(cause);

        assert_eq!(err.to_string(), expected);
        assert!(err.to_string().contains("expected a sequence"));
    }

    #[test]
    fn test_browser_error_display_includes_cause() {
        let err = DiagramError::from(CdpError::Timeout);

        assert_eq!(
            err.to_string(),
            format!("browser error: {}", CdpError::Timeout)
        );
        assert_ne!(err.to_string(), "browser error: ");
    }
}
