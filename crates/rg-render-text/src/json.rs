use std::collections::BTreeSet;

use rg_core::{
    Artifact, ArtifactFormat, GraphRenderer, RelationGraph, RenderError, RenderOptions,
};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct JsonGraph<'a> {
    node_count: usize,
    edge_count: usize,
    nodes: Vec<JsonNode<'a>>,
    edges: Vec<JsonEdge<'a>>,
    entity_types: BTreeSet<&'a str>,
    relation_names: BTreeSet<&'a str>,
}

#[derive(Debug, Serialize)]
struct JsonNode<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    entity_type: &'a str,
    label: &'a str,
    display: String,
    in_degree: usize,
    out_degree: usize,
    degree: usize,
}

#[derive(Debug, Serialize)]
struct JsonEdge<'a> {
    source: &'a str,
    target: &'a str,
    relation: &'a str,
}

/// Render nodes (with display label and degree) and edges as JSON.
pub fn render_json(
    graph: &RelationGraph,
    options: &RenderOptions,
    pretty: bool,
) -> Result<String, RenderError> {
    let degrees = graph.degrees();
    let document = JsonGraph {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        nodes: graph
            .nodes()
            .map(|(id, entity)| {
                let degree = degrees.get(id).copied().unwrap_or_default();
                JsonNode {
                    id: id.as_str(),
                    entity_type: &entity.entity_type,
                    label: &entity.label,
                    display: entity.display_label(options.label_style),
                    in_degree: degree.incoming,
                    out_degree: degree.outgoing,
                    degree: degree.total(),
                }
            })
            .collect(),
        edges: graph
            .edges()
            .iter()
            .map(|edge| JsonEdge {
                source: edge.source.as_str(),
                target: edge.target.as_str(),
                relation: &edge.relation,
            })
            .collect(),
        entity_types: graph.entity_types(),
        relation_names: graph.relation_names(),
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    };
    let json = rendered.map_err(|err| RenderError::new("json", err.to_string()))?;
    debug!(bytes = json.len(), pretty, "rendered json");
    Ok(json)
}

/// JSON backend.
#[derive(Debug, Clone, Default)]
pub struct JsonRenderer {
    pub options: RenderOptions,
    pub pretty: bool,
}

impl JsonRenderer {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            pretty: true,
        }
    }
}

impl GraphRenderer for JsonRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Json
    }

    fn render(&self, graph: &RelationGraph) -> Result<Artifact, RenderError> {
        render_json(graph, &self.options, self.pretty).map(|json| Artifact::new(self.format(), json))
    }
}

#[cfg(test)]
mod tests {
    use rg_core::{LabelStyle, RenderOptions};
    use serde_json::Value;

    use super::render_json;

    fn sample() -> rg_core::RelationGraph {
        rg_parser::parse([
            "[9], Gov:three-letter agency",
            "[4], object:int",
            "[5], string:string",
            "[9] WRAPPED_IN [4]",
            "[9] WRAPPED_IN [5]",
        ])
        .expect("valid records")
        .graph
    }

    #[test]
    fn counts_and_nodes_match_graph() {
        let json = render_json(&sample(), &RenderOptions::default(), false).expect("renders");
        let value: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["node_count"], 3);
        assert_eq!(value["edge_count"], 2);

        let nodes = value["nodes"].as_array().expect("nodes array");
        let ids: Vec<&str> = nodes.iter().filter_map(|n| n["id"].as_str()).collect();
        assert_eq!(ids, ["4", "5", "9"]);
        assert_eq!(nodes[2]["type"], "Gov");
        assert_eq!(nodes[2]["display"], "Gov:three-letter agency");
        assert_eq!(nodes[2]["out_degree"], 2);
        assert_eq!(nodes[0]["in_degree"], 1);
    }

    #[test]
    fn edges_and_summaries_are_listed() {
        let json = render_json(&sample(), &RenderOptions::default(), false).expect("renders");
        let value: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(
            value["edges"][0],
            serde_json::json!({"source": "9", "target": "4", "relation": "WRAPPED_IN"})
        );
        assert_eq!(value["relation_names"], serde_json::json!(["WRAPPED_IN"]));
        assert_eq!(
            value["entity_types"],
            serde_json::json!(["Gov", "object", "string"])
        );
    }

    #[test]
    fn spaced_style_changes_display_only() {
        let options = RenderOptions::default().with_label_style(LabelStyle::Spaced);
        let json = render_json(&sample(), &options, true).expect("renders");
        assert!(json.contains("\"display\": \"object: int\""));
        assert!(json.contains("\"label\": \"int\""));
        assert!(json.contains('\n'));
    }
}
