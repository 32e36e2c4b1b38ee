//! Mermaid parsing and rendering through headless Chrome.
//!
//! This crate loads the Mermaid bundle into a headless browser page and uses
//! it to:
//! - parse flowcharts into typed records ([`ParsedDiagram`])
//! - render diagrams to SVG markup
//! - rasterize diagrams to PNG, clipped to the drawing's bounding box
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - `session`: browser launch, bootstrap page, Mermaid injection, teardown
//! - `evaluate`: page-context parse/render operations over the `DiagramPage` seam
//! - `scripts`: JavaScript sent to the page
//! - [`model`]: parse tree records
//! - `output`: writing results to disk
//!
//! Every operation runs in its own browser session, released on success and
//! failure alike. Page console output and uncaught page errors are forwarded
//! as `tracing` events with target `merbro::page`.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//!
//! let diagram = merbro_diagrams::parse("graph LR; A --> B").await?;
//! assert_eq!(diagram.vertices.len(), 2);
//!
//! let svg = merbro_diagrams::render_svg("graph LR; A --> B", Some(Path::new("ab.svg"))).await?;
//! ```

mod config;
mod consts;
mod error;
mod evaluate;
#[cfg(test)]
mod mock;
pub mod model;
mod output;
mod page;
mod renderer;
mod scripts;
mod session;

pub use config::{MermaidOptions, RendererConfig, ScriptSource};
pub use consts::{
    DEFAULT_MAX_DIMENSION, DEFAULT_MERMAID_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_VIEWPORT_HEIGHT,
    DEFAULT_VIEWPORT_WIDTH, MOUNT_ELEMENT_ID,
};
pub use error::{DiagramError, Result};
pub use model::{Edge, ParsedDiagram, Stroke, SubGraph, Vertex};
pub use renderer::{Renderer, parse, render_png, render_svg};
