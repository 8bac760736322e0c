use std::fmt::Write;

use rg_core::{Artifact, ArtifactFormat, GraphRenderer, RelationGraph, RenderError, RenderOptions};
use tracing::debug;

/// Quote a string as a DOT identifier.
#[must_use]
pub fn dot_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// Render the graph as a Graphviz `digraph`. Node statements come first in
/// id order, then one edge statement per relationship.
#[must_use]
pub fn render_dot(graph: &RelationGraph, options: &RenderOptions, title: &str) -> String {
    let style = options.label_style;
    let mut out = String::with_capacity(64 + graph.node_count() * 48 + graph.edge_count() * 64);
    out.push_str("digraph relgraph {\n");
    let _ = writeln!(out, "  label={};", dot_quote(title));
    out.push_str("  labelloc=t;\n");
    out.push_str("  node [shape=ellipse, style=filled, fillcolor=\"#abdda4\"];\n");
    out.push_str("  edge [color=\"#888888\", fontsize=10];\n");

    for (id, entity) in graph.nodes() {
        let label = entity.display_label(style);
        let _ = writeln!(
            out,
            "  {} [label={}, tooltip={}];",
            dot_quote(id.as_str()),
            dot_quote(&label),
            dot_quote(&label)
        );
    }

    for edge in graph.edges() {
        let source = graph
            .display_label(&edge.source, style)
            .unwrap_or_else(|| edge.source.to_string());
        let target = graph
            .display_label(&edge.target, style)
            .unwrap_or_else(|| edge.target.to_string());
        let _ = writeln!(
            out,
            "  {} -> {} [label={}, tooltip={}];",
            dot_quote(edge.source.as_str()),
            dot_quote(edge.target.as_str()),
            dot_quote(&edge.relation),
            dot_quote(&format!("{source} - {} -> {target}", edge.relation))
        );
    }

    out.push_str("}\n");
    debug!(bytes = out.len(), "rendered dot");
    out
}

/// Graphviz DOT backend.
#[derive(Debug, Clone)]
pub struct DotRenderer {
    pub options: RenderOptions,
    pub title: String,
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl DotRenderer {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            title: String::from("Relationship Graph"),
        }
    }
}

impl GraphRenderer for DotRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Dot
    }

    fn render(&self, graph: &RelationGraph) -> Result<Artifact, RenderError> {
        Ok(Artifact::new(
            self.format(),
            render_dot(graph, &self.options, &self.title),
        ))
    }
}
