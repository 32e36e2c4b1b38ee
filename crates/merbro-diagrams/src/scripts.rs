//! Page-context JavaScript for Mermaid evaluation.
//!
//! Every script is a single expression evaluated with awaited promises and
//! by-value results. Arguments (diagram source, Mermaid options, bundle
//! contents) are embedded as JSON literals so arbitrary text cannot break
//! out of the string.

use serde_json::Value;

use crate::config::MermaidOptions;
use crate::consts::{MOUNT_ELEMENT_ID, PNG_RENDER_ID, SVG_RENDER_ID};

/// Encode a string as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    Value::String(value.to_owned()).to_string()
}

/// Initialization call shared by all evaluation scripts.
///
/// `startOnLoad` is always forced off; the caller decides when to render.
fn initialize(options: &MermaidOptions) -> String {
    let options = serde_json::to_value(options).unwrap_or_else(|_| Value::Object(Default::default()));
    format!("mermaid.initialize(Object.assign({{}}, {options}, {{ startOnLoad: false }}));")
}

/// Build the parse script.
///
/// Reads the flowchart database accessors and normalizes Mermaid 11 `Map`s
/// into plain objects before they cross the page boundary.
pub(crate) fn parse(source: &str, options: &MermaidOptions) -> String {
    let init = initialize(options);
    let source = js_string(source);
    format!(
        r"(async () => {{
  const mermaid = globalThis.mermaid;
  {init}
  const diagram = await mermaid.mermaidAPI.getDiagramFromText({source});
  const db = diagram.db ?? diagram.getParser().yy;
  if (typeof db.getVertices !== 'function' || typeof db.getEdges !== 'function') {{
    throw new Error(`diagram type '${{diagram.type}}' does not expose flowchart accessors`);
  }}
  const plain = (value) => (value instanceof Map ? Object.fromEntries(value) : (value ?? {{}}));
  return {{
    title: db.getDiagramTitle?.() ?? '',
    accTitle: db.getAccTitle?.() ?? '',
    edges: db.getEdges() ?? [],
    vertices: plain(db.getVertices()),
    tooltip: db.getTooltip?.() ?? null,
    direction: db.getDirection?.() ?? '',
    classes: Object.keys(plain(db.getClasses?.())),
    subGraphs: db.getSubGraphs?.() ?? [],
  }};
}})()"
    )
}

/// Build the SVG render script.
pub(crate) fn render_svg(source: &str, options: &MermaidOptions) -> String {
    let init = initialize(options);
    let source = js_string(source);
    let id = js_string(SVG_RENDER_ID);
    format!(
        r"(async () => {{
  const mermaid = globalThis.mermaid;
  {init}
  const {{ svg }} = await mermaid.render({id}, {source});
  return svg;
}})()"
    )
}

/// Build the script that renders SVG markup into the mount element.
pub(crate) fn mount_svg(source: &str, options: &MermaidOptions) -> String {
    let init = initialize(options);
    let source = js_string(source);
    let id = js_string(PNG_RENDER_ID);
    let mount = js_string(MOUNT_ELEMENT_ID);
    format!(
        r"(async () => {{
  const mermaid = globalThis.mermaid;
  const container = document.getElementById({mount});
  if (!container) {{
    throw new Error('mount element #' + {mount} + ' not found');
  }}
  {init}
  const {{ svg }} = await mermaid.render({id}, {source}, container);
  container.innerHTML = svg;
  return true;
}})()"
    )
}

/// Build the script that measures the mounted SVG.
///
/// Returns the raw edges; snapping to pixels happens in [`Clip::from_rect`](crate::page::Clip::from_rect).
pub(crate) fn measure_svg() -> String {
    let mount = js_string(MOUNT_ELEMENT_ID);
    format!(
        r"(() => {{
  const svg = document.querySelector('#' + {mount} + ' svg');
  if (!svg) {{
    throw new Error('no rendered svg in #' + {mount});
  }}
  const rect = svg.getBoundingClientRect();
  return {{ left: rect.left, top: rect.top, right: rect.right, bottom: rect.bottom }};
}})()"
    )
}

/// Build the script that inlines a Mermaid bundle into a `<script>` element.
pub(crate) fn inject_inline(bundle: &str) -> String {
    let bundle = js_string(bundle);
    format!(
        r"(() => {{
  const script = document.createElement('script');
  script.textContent = {bundle};
  document.head.appendChild(script);
  return typeof globalThis.mermaid !== 'undefined';
}})()"
    )
}

/// Build the script that loads a Mermaid bundle from a URL and waits for it.
pub(crate) fn inject_url(url: &str) -> String {
    let url = js_string(url);
    format!(
        r"new Promise((resolve, reject) => {{
  const script = document.createElement('script');
  script.src = {url};
  script.onload = () => resolve(typeof globalThis.mermaid !== 'undefined');
  script.onerror = () => reject(new Error('failed to load ' + {url}));
  document.head.appendChild(script);
}})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes_and_newlines() {
        assert_eq!(js_string("a\"b\nc"), r#""a\"b\nc""#);
    }

    #[test]
    fn test_parse_script_embeds_source_as_literal() {
        let script = parse("graph LR\n  A[\"The A\"] --> B", &MermaidOptions::default());
        assert!(script.contains(r#"getDiagramFromText("graph LR\n  A[\"The A\"] --> B")"#));
        assert!(script.contains("startOnLoad: false"));
    }

    #[test]
    fn test_parse_script_reads_all_accessors() {
        let script = parse("graph TD; A-->B", &MermaidOptions::default());
        for accessor in [
            "getDiagramTitle",
            "getAccTitle",
            "getEdges",
            "getVertices",
            "getTooltip",
            "getDirection",
            "getClasses",
            "getSubGraphs",
        ] {
            assert!(script.contains(accessor), "missing {accessor}");
        }
    }

    #[test]
    fn test_initialize_includes_options() {
        let options = MermaidOptions {
            theme: Some("dark".to_owned()),
            security_level: Some("strict".to_owned()),
            font_family: None,
        };
        let script = render_svg("graph TD; A-->B", &options);
        assert!(script.contains(r#""theme":"dark""#));
        assert!(script.contains(r#""securityLevel":"strict""#));
        assert!(!script.contains("fontFamily"));
    }

    #[test]
    fn test_script_breakout_is_escaped() {
        let script = render_svg("\"); alert(1); (\"", &MermaidOptions::default());
        assert!(script.contains(r#""\"); alert(1); (\"""#));
    }

    #[test]
    fn test_mount_and_measure_target_mount_element() {
        let mount = mount_svg("graph TD; A-->B", &MermaidOptions::default());
        assert!(mount.contains(r#"document.getElementById("diagram")"#));
        assert!(mount.contains(r#"mermaid.render("merbro-png""#));
        assert!(measure_svg().contains("getBoundingClientRect"));
    }

    #[test]
    fn test_inject_url_rejects_on_error() {
        let script = inject_url("https://cdn.example.com/mermaid.min.js");
        assert!(script.contains(r#"script.src = "https://cdn.example.com/mermaid.min.js""#));
        assert!(script.contains("onerror"));
    }

    #[test]
    fn test_inject_inline_checks_global() {
        let script = inject_inline("var mermaid = {};");
        assert!(script.contains(r#"script.textContent = "var mermaid = {};""#));
        assert!(script.contains("typeof globalThis.mermaid"));
    }
}
