//! Public entry points.
//!
//! Each operation acquires its own [`Session`], runs one evaluation,
//! optionally writes the result, and releases the session on every path.
//! The `*_on` helpers own everything after acquisition, so release happens
//! in exactly one place per operation.

use std::path::Path;

use crate::config::RendererConfig;
use crate::error::{DiagramError, Result};
use crate::model::ParsedDiagram;
use crate::page::OwnedPage;
use crate::session::Session;
use crate::{evaluate, output};

/// Mermaid parser and renderer backed by headless Chrome.
///
/// The renderer holds configuration only; it can be shared across tasks and
/// its operations may run concurrently, each in its own browser.
///
/// # Example
///
/// ```ignore
/// use merbro_diagrams::{Renderer, RendererConfig};
///
/// let renderer = Renderer::new(RendererConfig::default().theme("forest"));
/// let diagram = renderer.parse("graph LR; A --> B").await?;
/// assert_eq!(diagram.direction, "LR");
///
/// renderer.render_png("graph LR; A --> B", Some(Path::new("out.png"))).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Create a renderer with the given configuration.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Parse a flowchart into vertices, edges, subgraphs and metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Evaluation`](crate::DiagramError::Evaluation) for
    /// invalid syntax or non-flowchart diagrams, and session errors if the
    /// browser cannot be prepared.
    pub async fn parse(&self, source: &str) -> Result<ParsedDiagram> {
        let session = Session::acquire(&self.config).await?;
        parse_on(session, &self.config, source).await
    }

    /// Render a diagram to SVG markup, optionally writing it to `path`.
    ///
    /// # Errors
    ///
    /// Returns evaluation errors for invalid syntax and
    /// [`DiagramError::Io`](crate::DiagramError::Io) if the file cannot be written.
    pub async fn render_svg(&self, source: &str, path: Option<&Path>) -> Result<String> {
        let session = Session::acquire(&self.config).await?;
        render_svg_on(session, &self.config, source, path).await
    }

    /// Render a diagram to PNG bytes, optionally writing them to `path`.
    ///
    /// # Errors
    ///
    /// Returns evaluation errors for invalid syntax,
    /// [`DiagramError::EmptyRender`](crate::DiagramError::EmptyRender) for a
    /// zero-area drawing and [`DiagramError::Io`](crate::DiagramError::Io) if
    /// the file cannot be written.
    pub async fn render_png(&self, source: &str, path: Option<&Path>) -> Result<Vec<u8>> {
        let session = Session::acquire(&self.config).await?;
        render_png_on(session, &self.config, source, path).await
    }
}

async fn parse_on(
    page: impl OwnedPage,
    config: &RendererConfig,
    source: &str,
) -> Result<ParsedDiagram> {
    let result = evaluate::parse(&page, source, &config.mermaid).await;
    page.release().await;
    result
}

async fn render_svg_on(
    page: impl OwnedPage,
    config: &RendererConfig,
    source: &str,
    path: Option<&Path>,
) -> Result<String> {
    let result = async {
        let svg = evaluate::render_svg(&page, source, &config.mermaid).await?;
        if let Some(path) = path {
            output::write_file(path, svg.as_bytes()).await?;
        }
        Ok::<_, DiagramError>(svg)
    }
    .await;
    page.release().await;
    result
}

async fn render_png_on(
    page: impl OwnedPage,
    config: &RendererConfig,
    source: &str,
    path: Option<&Path>,
) -> Result<Vec<u8>> {
    let result = async {
        let png =
            evaluate::render_png(&page, source, &config.mermaid, config.max_dimension).await?;
        if let Some(path) = path {
            output::write_file(path, &png).await?;
        }
        Ok::<_, DiagramError>(png)
    }
    .await;
    page.release().await;
    result
}

/// Parse a flowchart with the default configuration.
///
/// # Errors
///
/// See [`Renderer::parse`].
pub async fn parse(source: &str) -> Result<ParsedDiagram> {
    Renderer::default().parse(source).await
}

/// Render SVG with the default configuration.
///
/// # Errors
///
/// See [`Renderer::render_svg`].
pub async fn render_svg(source: &str, path: Option<&Path>) -> Result<String> {
    Renderer::default().render_svg(source, path).await
}

/// Render PNG with the default configuration.
///
/// # Errors
///
/// See [`Renderer::render_png`].
pub async fn render_png(source: &str, path: Option<&Path>) -> Result<Vec<u8>> {
    Renderer::default().render_png(source, path).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::mock::MockPage;

    fn flowchart() -> serde_json::Value {
        json!({ "direction": "TD", "vertices": {}, "edges": [] })
    }

    #[tokio::test]
    async fn test_parse_releases_page_on_success() {
        let page = MockPage::new().respond(flowchart());
        let releases = page.release_counter();

        let diagram = parse_on(page, &RendererConfig::default(), "graph TD")
            .await
            .unwrap();

        assert_eq!(diagram.direction, "TD");
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parse_releases_page_on_evaluation_error() {
        let page = MockPage::new().fail("Error: Parse error on line 1");
        let releases = page.release_counter();

        let err = parse_on(page, &RendererConfig::default(), "graph TD\n A[")
            .await
            .unwrap_err();

        assert!(matches!(err, DiagramError::Evaluation { .. }));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_svg_writes_file_and_releases_page() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.svg");
        let page = MockPage::new().respond(json!("<svg></svg>"));
        let releases = page.release_counter();

        let svg = render_svg_on(page, &RendererConfig::default(), "graph TD", Some(&path))
            .await
            .unwrap();

        assert_eq!(svg, "<svg></svg>");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), svg);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_svg_evaluation_error_releases_page_without_writing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.svg");
        let page = MockPage::new().fail("Error: Lexical error on line 1");
        let releases = page.release_counter();

        let err = render_svg_on(page, &RendererConfig::default(), "graph TD", Some(&path))
            .await
            .unwrap_err();

        assert!(matches!(err, DiagramError::Evaluation { .. }));
        assert!(!path.exists());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_svg_write_error_releases_page() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing").join("out.svg");
        let page = MockPage::new().respond(json!("<svg></svg>"));
        let releases = page.release_counter();

        let err = render_svg_on(page, &RendererConfig::default(), "graph TD", Some(&path))
            .await
            .unwrap_err();

        assert!(matches!(err, DiagramError::Io { .. }));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_png_releases_page_on_success() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.png");
        let page = MockPage::new()
            .respond(json!(true))
            .respond(json!({ "left": 0, "top": 0, "right": 40, "bottom": 20 }));
        let releases = page.release_counter();

        let png = render_png_on(page, &RendererConfig::default(), "graph TD", Some(&path))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), png);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_png_empty_render_releases_page() {
        let page = MockPage::new()
            .respond(json!(true))
            .respond(json!({ "left": 0, "top": 0, "right": 0, "bottom": 0 }));
        let releases = page.release_counter();

        let err = render_png_on(page, &RendererConfig::default(), "graph TD", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DiagramError::EmptyRender { .. }));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_png_write_error_releases_page() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing").join("out.png");
        let page = MockPage::new()
            .respond(json!(true))
            .respond(json!({ "left": 0, "top": 0, "right": 40, "bottom": 20 }));
        let releases = page.release_counter();

        let err = render_png_on(page, &RendererConfig::default(), "graph TD", Some(&path))
            .await
            .unwrap_err();

        assert!(matches!(err, DiagramError::Io { .. }));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
