//! Spring layout of a [`RelationGraph`] on top of the `force_graph` simulation.

use std::f32::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use rg_core::{EntityId, RelationGraph};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Simulation time step per iteration, in seconds.
const TIME_STEP: f32 = 0.016;
const NODE_MASS: f32 = 10.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Simulation steps. Zero keeps the initial circle.
    pub iterations: usize,
    pub width: f32,
    pub height: f32,
    /// Empty border kept around the laid out nodes.
    pub padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            width: 800.0,
            height: 600.0,
            padding: 60.0,
        }
    }
}

impl LayoutConfig {
    fn inner_size(&self) -> (f32, f32) {
        let width = (self.width - 2.0 * self.padding).max(1.0);
        let height = (self.height - 2.0 * self.padding).max(1.0);
        (width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Node coordinates inside a `width` x `height` canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    positions: Vec<(EntityId, Point)>,
    index: FxHashMap<EntityId, usize>,
    pub width: f32,
    pub height: f32,
}

impl GraphLayout {
    fn new(positions: Vec<(EntityId, Point)>, config: &LayoutConfig) -> Self {
        let index = positions
            .iter()
            .enumerate()
            .map(|(slot, (id, _))| (id.clone(), slot))
            .collect();
        Self {
            positions,
            index,
            width: config.width,
            height: config.height,
        }
    }

    #[must_use]
    pub fn position(&self, id: &EntityId) -> Option<Point> {
        self.index.get(id).map(|slot| self.positions[*slot].1)
    }

    /// Positions in node order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, Point)> {
        self.positions.iter().map(|(id, point)| (id, *point))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Lay the graph out with a spring simulation.
///
/// Nodes start evenly spaced on a circle in id order and the simulation runs
/// for a fixed number of steps, so the same graph and config always give the
/// same coordinates. Parallel edges and both directions between a pair add a
/// single spring; self-loops add none. If the simulation diverges the circle
/// is returned instead.
#[must_use]
pub fn force_layout(graph: &RelationGraph, config: &LayoutConfig) -> GraphLayout {
    let ids: Vec<EntityId> = graph.nodes().map(|(id, _)| id.clone()).collect();
    let seed = circle_seed(ids.len(), config);

    if ids.len() < 2 || config.iterations == 0 {
        return GraphLayout::new(ids.into_iter().zip(seed).collect(), config);
    }

    let mut simulation = ForceGraph::<usize, ()>::new(SimulationParameters {
        force_charge: 150.0,
        force_spring: 0.05,
        force_max: 100.0,
        node_speed: 3000.0,
        damping_factor: 0.9,
    });

    let mut handles: FxHashMap<&EntityId, DefaultNodeIdx> = FxHashMap::default();
    for (slot, (id, start)) in ids.iter().zip(&seed).enumerate() {
        let handle = simulation.add_node(NodeData {
            x: start.x,
            y: start.y,
            mass: NODE_MASS,
            is_anchor: false,
            user_data: slot,
        });
        handles.insert(id, handle);
    }

    let mut springs: FxHashSet<(DefaultNodeIdx, DefaultNodeIdx)> = FxHashSet::default();
    for edge in graph.edges() {
        if edge.is_self_loop() {
            continue;
        }
        let (Some(&source), Some(&target)) = (handles.get(&edge.source), handles.get(&edge.target))
        else {
            continue;
        };
        let pair = if source < target {
            (source, target)
        } else {
            (target, source)
        };
        if springs.insert(pair) {
            simulation.add_edge(pair.0, pair.1, EdgeData::default());
        }
    }

    for _ in 0..config.iterations {
        simulation.update(TIME_STEP);
    }

    let mut raw = seed.clone();
    simulation.visit_nodes(|node| {
        raw[node.data.user_data] = Point::new(node.x(), node.y());
    });

    let positions = if raw.iter().all(|point| point.is_finite()) {
        fit_to_canvas(&raw, config)
    } else {
        warn!(
            nodes = ids.len(),
            "spring simulation produced non-finite coordinates; using circle layout"
        );
        seed
    };
    debug!(
        nodes = ids.len(),
        springs = springs.len(),
        iterations = config.iterations,
        "computed force layout"
    );
    GraphLayout::new(ids.into_iter().zip(positions).collect(), config)
}

/// Evenly spaced points on a circle centered in the canvas.
fn circle_seed(count: usize, config: &LayoutConfig) -> Vec<Point> {
    let center = Point::new(config.width / 2.0, config.height / 2.0);
    if count == 1 {
        return vec![center];
    }
    let (inner_width, inner_height) = config.inner_size();
    let radius = inner_width.min(inner_height) / 2.0;
    (0..count)
        .map(|slot| {
            let angle = (slot as f32) * 2.0 * PI / count as f32;
            Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Uniformly scale and translate points into the padded canvas.
fn fit_to_canvas(points: &[Point], config: &LayoutConfig) -> Vec<Point> {
    let (min_x, max_x) = span(points.iter().map(|p| p.x));
    let (min_y, max_y) = span(points.iter().map(|p| p.y));
    let (inner_width, inner_height) = config.inner_size();
    let span_x = max_x - min_x;
    let span_y = max_y - min_y;

    let scale_x = if span_x > f32::EPSILON { inner_width / span_x } else { f32::INFINITY };
    let scale_y = if span_y > f32::EPSILON { inner_height / span_y } else { f32::INFINITY };
    let scale = scale_x.min(scale_y);
    let scale = if scale.is_finite() { scale } else { 1.0 };

    let offset_x = config.padding + (inner_width - span_x * scale) / 2.0;
    let offset_y = config.padding + (inner_height - span_y * scale) / 2.0;
    points
        .iter()
        .map(|p| {
            Point::new(
                offset_x + (p.x - min_x) * scale,
                offset_y + (p.y - min_y) * scale,
            )
        })
        .collect()
}

fn span(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rg_core::EntityId;

    use super::{LayoutConfig, Point, fit_to_canvas, force_layout};

    fn graph(records: &[&str]) -> rg_core::RelationGraph {
        rg_parser::parse(records).expect("valid records").graph
    }

    #[test]
    fn empty_graph_has_no_positions() {
        let layout = force_layout(&graph(&[]), &LayoutConfig::default());
        assert!(layout.is_empty());
    }

    #[test]
    fn single_node_sits_in_the_center() {
        let layout = force_layout(&graph(&["[1], T:only"]), &LayoutConfig::default());
        assert_eq!(layout.position(&EntityId::new("1")), Some(Point::new(400.0, 300.0)));
    }

    #[test]
    fn zero_iterations_keeps_the_seed_circle() {
        let config = LayoutConfig {
            iterations: 0,
            ..LayoutConfig::default()
        };
        let layout = force_layout(
            &graph(&["[1], T:a", "[2], T:b", "[3], T:c", "[4], T:d"]),
            &config,
        );
        let first = layout.position(&EntityId::new("1")).expect("node 1 placed");
        let third = layout.position(&EntityId::new("3")).expect("node 3 placed");
        // Radius is half the smaller padded side: (600 - 120) / 2.
        assert!((first.x - 640.0).abs() < 1e-3 && (first.y - 300.0).abs() < 1e-3);
        assert!((third.x - 160.0).abs() < 1e-3 && (third.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn layout_stays_inside_the_padded_canvas() {
        let config = LayoutConfig::default();
        let layout = force_layout(
            &graph(&[
                "[1], COMPANY:Acme",
                "[2], COMPANY:Beta",
                "[3], GOV:Agency",
                "[1] OWNS [2]",
                "[1] OWNS [2]",
                "[2] OWNS [1]",
                "[3] REGULATES [1]",
                "[3] X [3]",
            ]),
            &config,
        );
        assert_eq!(layout.len(), 3);
        for (_, point) in layout.iter() {
            assert!(point.is_finite());
            assert!(point.x >= config.padding - 1e-3);
            assert!(point.x <= config.width - config.padding + 1e-3);
            assert!(point.y >= config.padding - 1e-3);
            assert!(point.y <= config.height - config.padding + 1e-3);
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let records = ["[1], T:a", "[2], T:b", "[3], T:c", "[1] R [2]", "[2] R [3]"];
        let config = LayoutConfig::default();
        assert_eq!(
            force_layout(&graph(&records), &config),
            force_layout(&graph(&records), &config)
        );
    }

    #[test]
    fn coincident_points_are_centered() {
        let config = LayoutConfig::default();
        let fitted = fit_to_canvas(&[Point::new(5.0, 5.0), Point::new(5.0, 5.0)], &config);
        assert_eq!(fitted, [Point::new(400.0, 300.0), Point::new(400.0, 300.0)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_coordinates_are_finite(
            edges in proptest::collection::vec((1usize..7, 1usize..7), 0..12),
            iterations in 0usize..60,
        ) {
            let mut records: Vec<String> = (1..7).map(|id| format!("[{id}], T:n{id}")).collect();
            records.extend(edges.iter().map(|(s, t)| format!("[{s}] LINKS [{t}]")));
            let graph = rg_parser::parse(&records).expect("valid records").graph;
            let config = LayoutConfig { iterations, ..LayoutConfig::default() };
            let layout = force_layout(&graph, &config);
            prop_assert_eq!(layout.len(), 6);
            for (_, point) in layout.iter() {
                prop_assert!(point.is_finite());
            }
        }
    }
}
