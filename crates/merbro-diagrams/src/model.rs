//! Parse tree records returned by [`Renderer::parse`](crate::Renderer::parse).
//!
//! Field names follow Mermaid's flowchart database so the records
//! deserialize directly from the page callback's JSON and serialize back to
//! the same shape for the CLI.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Flowchart structure as reported by Mermaid.
///
/// Vertices and class names are held in ordered collections so that parsing
/// the same source twice produces values that compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedDiagram {
    /// Diagram title (`---\ntitle: ...\n---` front matter or `title` directive).
    pub title: String,
    /// Accessible title (`accTitle: ...`).
    pub acc_title: String,
    /// Connections in declaration order.
    pub edges: Vec<Edge>,
    /// Vertices keyed by node id.
    pub vertices: BTreeMap<String, Vertex>,
    /// Diagram-level tooltip, if Mermaid reports one.
    pub tooltip: Option<String>,
    /// Layout direction (`TB`, `TD`, `BT`, `LR`, `RL`).
    pub direction: String,
    /// Names declared with `classDef`.
    pub classes: BTreeSet<String>,
    /// Subgraphs in declaration order.
    pub sub_graphs: Vec<SubGraph>,
}

impl ParsedDiagram {
    /// Look up a vertex by node id.
    #[must_use]
    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Edges ending at `id`.
    pub fn edges_to<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.end == id)
    }

    /// Node ids referenced by edges and subgraph memberships.
    #[must_use]
    pub fn referenced_ids(&self) -> BTreeSet<&str> {
        let from_edges = self
            .edges
            .iter()
            .flat_map(|edge| [edge.start.as_str(), edge.end.as_str()]);
        let from_sub_graphs = self
            .sub_graphs
            .iter()
            .flat_map(|sub_graph| sub_graph.nodes.iter().map(String::as_str));
        from_edges.chain(from_sub_graphs).collect()
    }
}

/// Connection between two vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Edge {
    /// Source node id.
    pub start: String,
    /// Target node id.
    pub end: String,
    /// Relation type (e.g. `arrow_point`, `arrow_open`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Label text.
    pub text: String,
    /// Label type (`text` or `markdown`).
    pub label_type: String,
    /// Stroke style.
    pub stroke: Stroke,
    /// Minimum rank span (number of dashes/dots in the connector).
    pub length: u32,
}

/// Edge stroke style.
///
/// Mermaid reports the style as a string; unrecognized spellings are kept in
/// [`Stroke::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stroke {
    /// `-->`
    #[default]
    Normal,
    /// `==>`
    Thick,
    /// `-.->`
    Dotted,
    /// `~~~`
    Invisible,
    /// Any other value.
    Other(String),
}

impl Stroke {
    /// Mermaid's spelling of this stroke style.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Thick => "thick",
            Self::Dotted => "dotted",
            Self::Invisible => "invisible",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for Stroke {
    fn from(value: String) -> Self {
        match value.as_str() {
            "normal" => Self::Normal,
            "thick" => Self::Thick,
            "dotted" => Self::Dotted,
            "invisible" => Self::Invisible,
            _ => Self::Other(value),
        }
    }
}

impl From<Stroke> for String {
    fn from(stroke: Stroke) -> Self {
        match stroke {
            Stroke::Other(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

/// Flowchart node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vertex {
    /// Node id as written in the source.
    pub id: String,
    /// Label type (`text` or `markdown`).
    pub label_type: String,
    /// Id used for the DOM element.
    pub dom_id: String,
    /// Inline style declarations (`style A fill:#f9f`).
    pub styles: Vec<String>,
    /// Attached class names (`A:::added`).
    pub classes: Vec<String>,
    /// Label text.
    pub text: String,
    /// Shape type (`square`, `round`, `diamond`, ...); absent for bare ids.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Auxiliary properties.
    pub props: serde_json::Map<String, serde_json::Value>,
}

/// Flowchart subgraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubGraph {
    /// Subgraph id.
    pub id: String,
    /// Member node ids.
    pub nodes: Vec<String>,
    /// Display title.
    pub title: String,
    /// Attached class names.
    pub classes: Vec<String>,
    /// Label type (`text` or `markdown`).
    pub label_type: String,
    /// Direction override (`direction LR` inside the subgraph).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_edge_from_mermaid_shape() {
        let edge: Edge = serde_json::from_value(json!({
            "start": "Proj1",
            "end": "Test",
            "type": "arrow_point",
            "text": "test-environment",
            "labelType": "text",
            "stroke": "dotted",
            "length": 1,
            "id": "L-Proj1-Test-0",
            "interpolate": "basis"
        }))
        .unwrap();

        assert_eq!(edge.start, "Proj1");
        assert_eq!(edge.end, "Test");
        assert_eq!(edge.kind, "arrow_point");
        assert_eq!(edge.text, "test-environment");
        assert_eq!(edge.stroke, Stroke::Dotted);
        assert_eq!(edge.length, 1);
    }

    #[test]
    fn test_stroke_unknown_value_preserved() {
        let stroke: Stroke = serde_json::from_value(json!("wavy")).unwrap();
        assert_eq!(stroke, Stroke::Other("wavy".to_owned()));
        assert_eq!(stroke.as_str(), "wavy");
        assert_eq!(serde_json::to_value(&stroke).unwrap(), json!("wavy"));
    }

    #[test]
    fn test_stroke_known_values() {
        for (raw, expected) in [
            ("normal", Stroke::Normal),
            ("thick", Stroke::Thick),
            ("dotted", Stroke::Dotted),
            ("invisible", Stroke::Invisible),
        ] {
            assert_eq!(Stroke::from(raw.to_owned()), expected);
            assert_eq!(expected.as_str(), raw);
        }
    }

    #[test]
    fn test_decode_vertex_without_shape() {
        let vertex: Vertex = serde_json::from_value(json!({
            "id": "Test",
            "labelType": "text",
            "domId": "flowchart-Test-12",
            "styles": [],
            "classes": [],
            "text": "Test",
            "props": {}
        }))
        .unwrap();

        assert_eq!(vertex.shape, None);
        assert_eq!(vertex.text, "Test");
        assert_eq!(vertex.dom_id, "flowchart-Test-12");
    }

    #[test]
    fn test_vertex_serializes_shape_as_type() {
        let vertex = Vertex {
            id: "A".to_owned(),
            shape: Some("square".to_owned()),
            ..Vertex::default()
        };
        let value = serde_json::to_value(&vertex).unwrap();
        assert_eq!(value["type"], json!("square"));
        assert_eq!(value["domId"], json!(""));
    }

    #[test]
    fn test_referenced_ids_include_sub_graph_members() {
        let diagram = ParsedDiagram {
            edges: vec![Edge {
                start: "A".to_owned(),
                end: "B".to_owned(),
                ..Edge::default()
            }],
            sub_graphs: vec![SubGraph {
                id: "S".to_owned(),
                nodes: vec!["B".to_owned(), "C".to_owned()],
                ..SubGraph::default()
            }],
            ..ParsedDiagram::default()
        };

        let ids: Vec<&str> = diagram.referenced_ids().into_iter().collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_edges_to_filters_by_end() {
        let edge = |start: &str, end: &str| Edge {
            start: start.to_owned(),
            end: end.to_owned(),
            ..Edge::default()
        };
        let diagram = ParsedDiagram {
            edges: vec![edge("A", "T"), edge("B", "C"), edge("D", "T")],
            ..ParsedDiagram::default()
        };

        let starts: Vec<&str> = diagram.edges_to("T").map(|e| e.start.as_str()).collect();
        assert_eq!(starts, vec!["A", "D"]);
    }
}
