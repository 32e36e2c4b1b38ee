//! Internal constants for browser-backed diagram rendering.

use std::time::Duration;

/// Mermaid IIFE bundle loaded when no script source is configured.
pub const DEFAULT_MERMAID_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.min.js";

/// Default timeout for a single DevTools request (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial viewport width in CSS pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 800;

/// Initial viewport height in CSS pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 600;

/// Upper bound for either viewport edge when fitting a raster capture.
pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

/// Id of the mount element in the bootstrap document.
pub const MOUNT_ELEMENT_ID: &str = "diagram";

/// Id passed to `mermaid.render` for SVG output.
pub(crate) const SVG_RENDER_ID: &str = "merbro-svg";

/// Id passed to `mermaid.render` for the SVG that gets rasterized.
pub(crate) const PNG_RENDER_ID: &str = "merbro-png";

/// Hosting page with a single `#diagram` mount element.
pub(crate) const BOOTSTRAP_HTML: &str = include_str!("../assets/bootstrap.html");

/// `tracing` target for events forwarded from the page.
pub(crate) const PAGE_LOG_TARGET: &str = "merbro::page";
