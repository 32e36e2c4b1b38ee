//! Page-context operations: parse, render SVG, render PNG.
//!
//! Each function runs against an already prepared [`DiagramPage`]; session
//! acquisition and release are the caller's job.

use crate::config::MermaidOptions;
use crate::error::{DiagramError, Result};
use crate::model::ParsedDiagram;
use crate::page::{BoundingRect, Clip, DiagramPage};
use crate::scripts;

/// Parse a diagram into its flowchart structure.
pub(crate) async fn parse(
    page: &impl DiagramPage,
    source: &str,
    options: &MermaidOptions,
) -> Result<ParsedDiagram> {
    let value = page.evaluate(&scripts::parse(source, options)).await?;
    let diagram: ParsedDiagram = serde_json::from_value(value)?;
    tracing::debug!(
        vertices = diagram.vertices.len(),
        edges = diagram.edges.len(),
        sub_graphs = diagram.sub_graphs.len(),
        "Parsed diagram"
    );
    Ok(diagram)
}

/// Render a diagram to SVG markup.
pub(crate) async fn render_svg(
    page: &impl DiagramPage,
    source: &str,
    options: &MermaidOptions,
) -> Result<String> {
    let value = page.evaluate(&scripts::render_svg(source, options)).await?;
    match value {
        serde_json::Value::String(svg) => Ok(svg),
        _ => Err(DiagramError::evaluation("mermaid.render returned no svg")),
    }
}

/// Render a diagram to PNG bytes.
///
/// The SVG is mounted first because the capture size depends on the laid-out
/// bounding box. The viewport is then fitted to the box (each edge capped at
/// `max_dimension`) and a clipped screenshot taken.
pub(crate) async fn render_png(
    page: &impl DiagramPage,
    source: &str,
    options: &MermaidOptions,
    max_dimension: u32,
) -> Result<Vec<u8>> {
    page.evaluate(&scripts::mount_svg(source, options)).await?;

    let rect: BoundingRect =
        serde_json::from_value(page.evaluate(&scripts::measure_svg()).await?)?;
    let clip = Clip::from_rect(rect);
    if clip.width == 0 || clip.height == 0 {
        return Err(DiagramError::EmptyRender {
            width: clip.width,
            height: clip.height,
        });
    }

    let width = clip.right().min(max_dimension);
    let height = clip.bottom().min(max_dimension);
    let beyond_viewport = width < clip.right() || height < clip.bottom();
    if beyond_viewport {
        tracing::warn!(
            width = clip.right(),
            height = clip.bottom(),
            max_dimension,
            "Diagram exceeds maximum viewport, capturing beyond viewport"
        );
    }

    page.resize_viewport(width, height).await?;
    let png = page.capture_png(clip, beyond_viewport).await?;

    let (png_width, png_height) = png_dimensions(&png).ok_or(DiagramError::InvalidPng)?;
    tracing::debug!(
        width = png_width,
        height = png_height,
        bytes = png.len(),
        "Captured diagram"
    );
    Ok(png)
}

/// Extract width and height from PNG image data.
///
/// PNG format: 8-byte signature, then IHDR chunk with width/height at bytes 16-24.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 {
        return None;
    }

    if &data[0..8] != b"\x89PNG\r\n\x1a\n" {
        return None;
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}
