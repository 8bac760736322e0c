use std::fmt::Write;

use rg_core::{Artifact, ArtifactFormat, GraphRenderer, RelationGraph, RenderError, RenderOptions};
use tracing::trace;

/// One `source - RELATION -> target` line per edge, followed by the nodes
/// that take part in no relationship.
#[must_use]
pub fn render_listing(graph: &RelationGraph, options: &RenderOptions) -> String {
    let style = options.label_style;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {} entities, {} relationships",
        graph.node_count(),
        graph.edge_count()
    );

    for edge in graph.edges() {
        let source = graph
            .display_label(&edge.source, style)
            .unwrap_or_else(|| format!("[{}]", edge.source));
        let target = graph
            .display_label(&edge.target, style)
            .unwrap_or_else(|| format!("[{}]", edge.target));
        let _ = writeln!(out, "{source} - {} -> {target}", edge.relation);
    }

    let degrees = graph.degrees();
    let isolated: Vec<String> = graph
        .nodes()
        .filter(|(id, _)| degrees.get(id).is_none_or(|degree| degree.total() == 0))
        .map(|(id, entity)| format!("[{id}] {}", entity.display_label(style)))
        .collect();
    if !isolated.is_empty() {
        out.push_str("# isolated\n");
        for line in isolated {
            out.push_str(&line);
            out.push('\n');
        }
    }
    trace!(lines = out.lines().count(), "rendered edge listing");
    out
}

/// Plain-text backend.
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    pub options: RenderOptions,
}

impl TextRenderer {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

impl GraphRenderer for TextRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Text
    }

    fn render(&self, graph: &RelationGraph) -> Result<Artifact, RenderError> {
        Ok(Artifact::new(
            self.format(),
            render_listing(graph, &self.options),
        ))
    }
}

#[cfg(test)]
mod tests {
    use rg_core::{LabelStyle, RenderOptions};

    use super::render_listing;

    #[test]
    fn lists_edges_then_isolated_nodes() {
        let graph = rg_parser::parse([
            "[1], PDF:sample PDF",
            "[3], DOCUMENT:PDF",
            "[6], DOCUMENT:Dictionary",
            "[18], INVOICE:invoice",
            "[3] IS PART OF [6]",
        ])
        .expect("valid records")
        .graph;
        let listing = render_listing(&graph, &RenderOptions::default());
        assert_eq!(
            listing,
            "# 4 entities, 1 relationships\n\
             DOCUMENT:PDF - IS PART OF -> DOCUMENT:Dictionary\n\
             # isolated\n\
             [1] PDF:sample PDF\n\
             [18] INVOICE:invoice\n"
        );
    }

    #[test]
    fn self_loop_node_is_not_isolated() {
        let graph = rg_parser::parse(["[1] X [1]", "[1], T:self"])
            .expect("valid records")
            .graph;
        let options = RenderOptions::default().with_label_style(LabelStyle::Spaced);
        assert_eq!(
            render_listing(&graph, &options),
            "# 1 entities, 1 relationships\nT: self - X -> T: self\n"
        );
    }
}
