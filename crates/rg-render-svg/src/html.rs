//! Standalone HTML page wrapping the SVG drawing.

use rg_core::{Artifact, ArtifactFormat, GraphRenderer, RelationGraph, RenderError};

use crate::attributes::escape_xml_text;
use crate::{SvgRenderConfig, render_svg};

const PAGE_CSS: &str = "\
body{margin:0;font-family:system-ui,-apple-system,sans-serif;background:#f6f7f9}\
main{max-width:1200px;margin:0 auto;padding:16px}\
figure{margin:0;background:#fff;box-shadow:0 1px 3px rgba(0,0,0,.15)}\
figcaption{padding:8px 12px;color:#555;font-size:13px}";

/// Render a graph to a self-contained HTML document. Hovering a node or an
/// edge shows its tooltip.
pub fn render_html(graph: &RelationGraph, config: &SvgRenderConfig) -> Result<String, RenderError> {
    let svg = render_svg(graph, config).map_err(|err| RenderError::new("html", err.message))?;
    let title = escape_xml_text(&config.title);
    let caption = format!(
        "{} entities, {} relationships",
        graph.node_count(),
        graph.edge_count()
    );

    let mut page = String::with_capacity(svg.len() + 512);
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    page.push_str(&format!("<title>{title}</title>\n"));
    page.push_str(&format!("<style>{PAGE_CSS}</style>\n"));
    page.push_str("</head>\n<body>\n<main>\n<figure>\n");
    page.push_str(&svg);
    page.push_str(&format!("\n<figcaption>{caption}</figcaption>\n"));
    page.push_str("</figure>\n</main>\n</body>\n</html>\n");
    Ok(page)
}

/// HTML backend.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    pub config: SvgRenderConfig,
}

impl HtmlRenderer {
    #[must_use]
    pub fn new(config: SvgRenderConfig) -> Self {
        Self { config }
    }
}

impl GraphRenderer for HtmlRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Html
    }

    fn render(&self, graph: &RelationGraph) -> Result<Artifact, RenderError> {
        render_html(graph, &self.config).map(|page| Artifact::new(self.format(), page))
    }
}
