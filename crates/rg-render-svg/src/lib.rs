#![forbid(unsafe_code)]

//! SVG and HTML rendering of relationship graphs.
//!
//! Nodes are placed with a spring simulation ([`force_layout`]), drawn as
//! circles colored and sized by degree, and carry `<title>` tooltips with
//! their display label. Edges are arrows with the relation name on a boxed
//! label at their midpoint.

mod attributes;
mod document;
mod element;
mod html;
mod layout;
mod palette;
mod text;

pub use attributes::{AttributeValue, Attributes, escape_xml_attr, escape_xml_text};
pub use document::SvgDocument;
pub use element::{Element, ElementKind};
pub use html::{HtmlRenderer, render_html};
pub use layout::{GraphLayout, LayoutConfig, Point, force_layout};
pub use palette::{DegreeScale, EDGE_COLOR, LABEL_COLOR, NODE_OUTLINE, SPECTRAL4};
pub use text::{TextMetrics, truncate_label};

use rg_core::{
    Artifact, ArtifactFormat, EntityId, GraphRenderer, LabelStyle, RelationGraph, RenderError,
    RenderOptions, Relationship,
};
use rustc_hash::FxHashMap;
use tracing::debug;

const ARROW_MARKER_ID: &str = "rg-arrow";
/// Gap between parallel edges drawn between the same pair of nodes.
const PARALLEL_EDGE_SPACING: f32 = 18.0;
/// Extra height of each further self-loop on the same node.
const SELF_LOOP_SPACING: f32 = 24.0;

const BASE_CSS: &str = "\
.rg-title{font-weight:600}\
.rg-node circle{cursor:pointer}\
.rg-node:hover circle{stroke-width:3}\
.rg-edge:hover line,.rg-edge:hover path{stroke:#fdae61;stroke-width:3}\
.rg-edge-label rect{fill:#fff;fill-opacity:0.8;stroke:#000;stroke-width:1}";

#[derive(Debug, Clone)]
pub struct SvgRenderConfig {
    pub options: RenderOptions,
    pub layout: LayoutConfig,
    /// Scale with the container instead of a fixed pixel size.
    pub responsive: bool,
    pub title: String,
    pub font_family: String,
    pub font_size: f32,
    /// Longest node label drawn under a node, in graphemes. The tooltip
    /// always carries the full label. Zero disables truncation.
    pub max_label_chars: usize,
    pub edge_labels: bool,
}

impl Default for SvgRenderConfig {
    fn default() -> Self {
        Self {
            options: RenderOptions::default(),
            layout: LayoutConfig::default(),
            responsive: true,
            title: String::from("Relationship Graph"),
            font_family: String::from("system-ui, -apple-system, sans-serif"),
            font_size: 11.0,
            max_label_chars: 32,
            edge_labels: true,
        }
    }
}

impl SvgRenderConfig {
    #[must_use]
    pub fn with_label_style(mut self, label_style: LabelStyle) -> Self {
        self.options.label_style = label_style;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
}

/// Render a graph to an SVG document string.
pub fn render_svg(graph: &RelationGraph, config: &SvgRenderConfig) -> Result<String, RenderError> {
    let canvas = &config.layout;
    if !(canvas.width.is_finite() && canvas.height.is_finite())
        || canvas.width <= 0.0
        || canvas.height <= 0.0
    {
        return Err(RenderError::new(
            "svg",
            format!(
                "canvas size must be positive, got {}x{}",
                canvas.width, canvas.height
            ),
        ));
    }

    let layout = force_layout(graph, canvas);
    let degrees = graph.degrees();
    let scale = DegreeScale::new(graph.max_degree());
    let metrics = TextMetrics::with_font_size(config.font_size);
    let style = config.options.label_style;

    let mut placed: FxHashMap<&EntityId, PlacedNode> = FxHashMap::default();
    for (id, entity) in graph.nodes() {
        let center = layout.position(id).ok_or_else(|| {
            RenderError::new("svg", format!("layout produced no position for [{id}]"))
        })?;
        let degree = degrees.get(id).map_or(0, |d| d.total());
        placed.insert(
            id,
            PlacedNode {
                center,
                radius: scale.radius(degree),
                color: scale.color(degree).to_string(),
                degree,
                label: entity.display_label(style),
            },
        );
    }

    let mut doc = SvgDocument::new()
        .viewbox(0.0, 0.0, canvas.width, canvas.height)
        .accessible(
            config.title.clone(),
            format!(
                "{} entities and {} relationships",
                graph.node_count(),
                graph.edge_count()
            ),
        )
        .class("rg-graph")
        .data("nodes", &graph.node_count().to_string())
        .data("edges", &graph.edge_count().to_string())
        .style(BASE_CSS);
    doc = if config.responsive {
        doc.responsive()
    } else {
        doc.size(canvas.width, canvas.height)
    };

    doc = doc
        .child(arrow_defs())
        .child(
            Element::rect(Point::new(0.0, 0.0), canvas.width, canvas.height)
                .fill("#ffffff")
                .class("rg-background"),
        )
        .child(
            Element::text(
                Point::new(canvas.width / 2.0, config.font_size * 2.0),
                config.title.clone(),
            )
            .font(&config.font_family, config.font_size * 1.5)
            .fill(LABEL_COLOR)
            .class("rg-title"),
        );

    let routes = edge_routes(graph.edges());
    let mut edge_layer = Element::group("rg-edges");
    for (edge, route) in graph.edges().iter().zip(routes) {
        let (Some(source), Some(target)) = (placed.get(&edge.source), placed.get(&edge.target))
        else {
            return Err(RenderError::new(
                "svg",
                format!("edge `{edge}` has an endpoint without a position"),
            ));
        };
        edge_layer = edge_layer.child(render_edge(edge, source, target, route, &metrics, config));
    }
    doc = doc.child(edge_layer);

    let mut node_layer = Element::group("rg-nodes");
    for (id, _) in graph.nodes() {
        if let Some(node) = placed.get(id) {
            node_layer = node_layer.child(render_node(id, node, config));
        }
    }
    doc = doc.child(node_layer);

    let svg = doc.to_string();
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        bytes = svg.len(),
        "rendered svg"
    );
    Ok(svg)
}

/// SVG backend.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    pub config: SvgRenderConfig,
}

impl SvgRenderer {
    #[must_use]
    pub fn new(config: SvgRenderConfig) -> Self {
        Self { config }
    }
}

impl GraphRenderer for SvgRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Svg
    }

    fn render(&self, graph: &RelationGraph) -> Result<Artifact, RenderError> {
        render_svg(graph, &self.config).map(|svg| Artifact::new(self.format(), svg))
    }
}

#[derive(Debug, Clone)]
struct PlacedNode {
    center: Point,
    radius: f32,
    color: String,
    degree: usize,
    label: String,
}

fn arrow_defs() -> Element {
    Element::defs().child(
        Element::marker(ARROW_MARKER_ID)
            .attr("viewBox", "0 0 10 10")
            .num("refX", 10.0)
            .num("refY", 5.0)
            .num("markerWidth", 8.0)
            .num("markerHeight", 8.0)
            .attr("orient", "auto-start-reverse")
            .child(Element::path("M 0 0 L 10 5 L 0 10 z").fill(EDGE_COLOR)),
    )
}

/// How one edge is drawn relative to the other edges on the same nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Route {
    /// Perpendicular offset from the straight line between the endpoints.
    Bend(f32),
    /// Rank among the self-loops of one node; higher ranks loop wider.
    Loop(usize),
}

/// Routes that keep parallel edges, opposite edges and repeated self-loops
/// from overlapping. A single edge between two nodes gets `Bend(0.0)`.
fn edge_routes(edges: &[Relationship]) -> Vec<Route> {
    let mut totals: FxHashMap<(&EntityId, &EntityId), usize> = FxHashMap::default();
    for edge in edges.iter().filter(|edge| !edge.is_self_loop()) {
        *totals.entry(unordered(edge)).or_default() += 1;
    }

    let mut seen: FxHashMap<(&EntityId, &EntityId), usize> = FxHashMap::default();
    edges
        .iter()
        .map(|edge| {
            let pair = unordered(edge);
            let slot = seen.entry(pair).or_default();
            let rank = *slot;
            *slot += 1;
            if edge.is_self_loop() {
                return Route::Loop(rank);
            }
            let total = totals.get(&pair).copied().unwrap_or(1);
            let offset = rank as f32 - (total as f32 - 1.0) / 2.0;
            Route::Bend(offset * PARALLEL_EDGE_SPACING)
        })
        .collect()
}

fn unordered(edge: &Relationship) -> (&EntityId, &EntityId) {
    if edge.source <= edge.target {
        (&edge.source, &edge.target)
    } else {
        (&edge.target, &edge.source)
    }
}

fn render_edge(
    edge: &Relationship,
    source: &PlacedNode,
    target: &PlacedNode,
    route: Route,
    metrics: &TextMetrics,
    config: &SvgRenderConfig,
) -> Element {
    let tooltip = format!("{} - {} -> {}", source.label, edge.relation, target.label);
    let mut group = Element::group("rg-edge")
        .data("source", edge.source.as_str())
        .data("target", edge.target.as_str())
        .data("relation", &edge.relation)
        .child(Element::title(tooltip));

    let (shape, label_at) = match route {
        Route::Loop(rank) => self_loop_shape(source, rank),
        Route::Bend(bend) => edge_shape(edge, source, target, bend),
    };
    group = group.child(shape);

    if config.edge_labels {
        group = group.child(edge_label(&edge.relation, label_at, metrics, config));
    }
    group
}

/// Straight line (or a bent curve for parallel edges) from the rim of the
/// source circle to the rim of the target circle.
fn edge_shape(
    edge: &Relationship,
    source: &PlacedNode,
    target: &PlacedNode,
    bend: f32,
) -> (Element, Point) {
    let (from, to) = (source.center, target.center);
    let distance = from.distance(to);
    let mid = from.midpoint(to);
    if distance < 1e-3 {
        return (Element::line(from, to).stroke(EDGE_COLOR, 2.0), mid);
    }

    let (ux, uy) = ((to.x - from.x) / distance, (to.y - from.y) / distance);
    // The normal is taken in the pair's canonical direction so that
    // opposite edges bend to opposite sides.
    let flip = if edge.source <= edge.target { 1.0 } else { -1.0 };
    let (nx, ny) = (-uy * flip, ux * flip);

    let start = Point::new(from.x + ux * source.radius, from.y + uy * source.radius);
    let end = Point::new(
        to.x - ux * (target.radius + 1.0),
        to.y - uy * (target.radius + 1.0),
    );

    if bend == 0.0 {
        let line = Element::line(start, end)
            .stroke(EDGE_COLOR, 2.0)
            .arrow(ARROW_MARKER_ID);
        return (line, mid);
    }

    let control = Point::new(mid.x + nx * bend * 2.0, mid.y + ny * bend * 2.0);
    let curve = Element::path(&format!(
        "M {:.2} {:.2} Q {:.2} {:.2} {:.2} {:.2}",
        start.x, start.y, control.x, control.y, end.x, end.y
    ))
    .fill("none")
    .stroke(EDGE_COLOR, 2.0)
    .arrow(ARROW_MARKER_ID);
    (curve, Point::new(mid.x + nx * bend, mid.y + ny * bend))
}

/// Loop above the node. Each further loop on the same node rises
/// `SELF_LOOP_SPACING` higher and spreads wider, so loops and their labels
/// stack instead of overlapping.
fn self_loop_shape(node: &PlacedNode, rank: usize) -> (Element, Point) {
    let Point { x, y } = node.center;
    let r = node.radius;
    let start = Point::new(x - r * 0.6, y - r * 0.8);
    let end = Point::new(x + r * 0.6, y - r * 0.8);
    let extra = rank as f32 * SELF_LOOP_SPACING;
    let lift = r * 3.5 + extra;
    let spread = r * 2.5 + extra / 3.0;
    let path = Element::path(&format!(
        "M {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
        start.x,
        start.y,
        x - spread,
        y - lift,
        x + spread,
        y - lift,
        end.x,
        end.y
    ))
    .fill("none")
    .stroke(EDGE_COLOR, 2.0)
    .arrow(ARROW_MARKER_ID)
    .class("rg-self-loop");
    // Apex of the cubic curve.
    (path, Point::new(x, y - r * 0.2 - lift * 0.75))
}

fn edge_label(
    relation: &str,
    at: Point,
    metrics: &TextMetrics,
    config: &SvgRenderConfig,
) -> Element {
    let padding = 2.0;
    let width = metrics.estimate_width(relation) + padding * 2.0;
    let height = metrics.line_height_px() + padding * 2.0;
    Element::group("rg-edge-label")
        .child(Element::rect(
            Point::new(at.x - width / 2.0, at.y - height / 2.0),
            width,
            height,
        ))
        .child(
            Element::text(at, relation)
                .attr("dominant-baseline", "central")
                .font(&config.font_family, config.font_size * 0.9)
                .fill("#000000"),
        )
}

fn render_node(id: &EntityId, node: &PlacedNode, config: &SvgRenderConfig) -> Element {
    let Point { x, y } = node.center;
    let caption = truncate_label(&node.label, config.max_label_chars);
    Element::group("rg-node")
        .data("id", id.as_str())
        .data("degree", &node.degree.to_string())
        .child(
            Element::circle(node.center, node.radius)
                .fill(&node.color)
                .stroke(NODE_OUTLINE, 2.0)
                .child(Element::title(node.label.clone())),
        )
        .child(
            Element::text(Point::new(x, y + node.radius + config.font_size + 2.0), caption)
                .font(&config.font_family, config.font_size)
                .fill(LABEL_COLOR)
                .class("rg-node-label"),
        )
}

#[cfg(test)]
mod tests {
    use rg_core::{ArtifactFormat, GraphRenderer, LabelStyle, Relationship};

    use super::{
        LayoutConfig, PARALLEL_EDGE_SPACING, Route, SvgRenderConfig, SvgRenderer, edge_routes,
        render_svg,
    };

    fn graph(records: &[&str]) -> rg_core::RelationGraph {
        rg_parser::parse(records).expect("valid records").graph
    }

    fn sample() -> rg_core::RelationGraph {
        graph(&[
            "[1], COMPANY:Acme",
            "[2], COMPANY:Beta",
            "[3], GOV:three-letter agency of the US government",
            "[1] OWNS [2]",
            "[3] REGULATES [1]",
            "[3] REGULATES [2]",
        ])
    }

    #[test]
    fn one_circle_and_tooltip_per_node() {
        let svg = render_svg(&sample(), &SvgRenderConfig::default()).expect("renders");
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("<title>COMPANY:Acme</title>"));
        assert!(svg.contains("<title>GOV:three-letter agency of the US government</title>"));
        assert!(svg.contains("<title>Relationship Graph</title>"));
    }

    #[test]
    fn edge_tooltips_name_both_ends() {
        let svg = render_svg(&sample(), &SvgRenderConfig::default()).expect("renders");
        assert!(svg.contains("<title>COMPANY:Acme - OWNS -&gt; COMPANY:Beta</title>"));
        assert_eq!(svg.matches("class=\"rg-edge\"").count(), 3);
        assert_eq!(svg.matches("class=\"rg-edge-label\"").count(), 3);
        assert!(svg.contains("marker-end=\"url(#rg-arrow)\""));
    }

    #[test]
    fn long_node_captions_are_truncated_but_tooltips_are_not() {
        let config = SvgRenderConfig {
            max_label_chars: 12,
            ..SvgRenderConfig::default()
        };
        let svg = render_svg(&sample(), &config).expect("renders");
        assert!(svg.contains(">GOV:three-l…</text>"));
        assert!(svg.contains("<title>GOV:three-letter agency of the US government</title>"));
    }

    #[test]
    fn spaced_label_style_reaches_tooltips() {
        let config = SvgRenderConfig::default().with_label_style(LabelStyle::Spaced);
        let svg = render_svg(&sample(), &config).expect("renders");
        assert!(svg.contains("<title>COMPANY: Acme</title>"));
    }

    #[test]
    fn self_loop_is_drawn_as_arc() {
        let svg = render_svg(&graph(&["[1] X [1]", "[1], T:self"]), &SvgRenderConfig::default())
            .expect("renders");
        assert!(svg.contains("class=\"rg-self-loop\""));
        assert!(svg.contains("<title>T:self - X -&gt; T:self</title>"));
    }

    #[test]
    fn busiest_node_uses_hottest_color() {
        let svg = render_svg(&sample(), &SvgRenderConfig::default()).expect("renders");
        assert!(svg.contains("fill=\"#d7191c\""));
    }

    #[test]
    fn empty_graph_renders_title_only() {
        let svg = render_svg(&graph(&[]), &SvgRenderConfig::default()).expect("renders");
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<circle").count(), 0);
        assert!(svg.contains("data-nodes=\"0\""));
    }

    #[test]
    fn rejects_degenerate_canvas() {
        let config = SvgRenderConfig::default().with_layout(LayoutConfig {
            width: 0.0,
            ..LayoutConfig::default()
        });
        let err = render_svg(&sample(), &config).expect_err("zero width");
        assert_eq!(err.backend, "svg");
    }

    #[test]
    fn fixed_size_when_not_responsive() {
        let config = SvgRenderConfig {
            responsive: false,
            ..SvgRenderConfig::default()
        };
        let svg = render_svg(&sample(), &config).expect("renders");
        assert!(svg.contains("width=\"800\" height=\"600\""));
    }

    #[test]
    fn renderer_trait_wraps_artifact() {
        let artifact = SvgRenderer::default().render(&sample()).expect("renders");
        assert_eq!(artifact.format, ArtifactFormat::Svg);
        assert!(artifact.content.ends_with("</svg>"));
    }

    #[test]
    fn parallel_edges_fan_out_symmetrically() {
        let edges = [
            Relationship::new("1", "2", "A"),
            Relationship::new("1", "2", "B"),
            Relationship::new("2", "1", "C"),
            Relationship::new("3", "3", "SELF"),
            Relationship::new("1", "3", "D"),
        ];
        assert_eq!(
            edge_routes(&edges),
            [
                Route::Bend(-PARALLEL_EDGE_SPACING),
                Route::Bend(0.0),
                Route::Bend(PARALLEL_EDGE_SPACING),
                Route::Loop(0),
                Route::Bend(0.0),
            ]
        );
    }

    #[test]
    fn repeated_self_loops_are_ranked_per_node() {
        let edges = [
            Relationship::new("1", "1", "A"),
            Relationship::new("2", "2", "B"),
            Relationship::new("1", "1", "C"),
            Relationship::new("1", "1", "A"),
        ];
        assert_eq!(
            edge_routes(&edges),
            [Route::Loop(0), Route::Loop(0), Route::Loop(1), Route::Loop(2)]
        );
    }

    #[test]
    fn self_loops_on_one_node_do_not_overlap() {
        let svg = render_svg(
            &graph(&["[1], T:self", "[1] A [1]", "[1] B [1]"]),
            &SvgRenderConfig::default(),
        )
        .expect("renders");
        let loops: Vec<&str> = svg
            .split("<path d=\"")
            .skip(1)
            .filter_map(|rest| rest.split("/>").next())
            .filter(|path| path.contains("rg-self-loop"))
            .collect();
        assert_eq!(loops.len(), 2);
        assert_ne!(loops[0], loops[1]);

        let label_ys: Vec<&str> = svg
            .split("<g class=\"rg-edge-label\"><rect x=\"")
            .skip(1)
            .filter_map(|rest| rest.split("y=\"").nth(1))
            .map(|rest| rest.split('"').next().unwrap_or_default())
            .collect();
        assert_eq!(label_ys.len(), 2);
        assert_ne!(label_ys[0], label_ys[1]);
    }
}
