#![forbid(unsafe_code)]

//! Graph model for the relgraph entity/relationship notation.
//!
//! A run parses entity records (`[1], COMPANY:Acme`) and relationship records
//! (`[1] OWNS [2]`) into a [`RelationGraph`]: a directed multigraph whose
//! nodes carry a typed label and whose edges carry a relation name. Rendering
//! backends consume the graph through [`GraphRenderer`].

mod error;
mod render;

pub use error::{
    DanglingReferenceError, ErrorCode, MalformedRecordError, RelGraphError, RenderError,
    SourceError,
};
pub use render::{Artifact, ArtifactFormat, GraphRenderer, RenderOptions};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque entity identifier.
///
/// Ids are compared numerically when both sides are all digits, so `[2]`
/// sorts before `[10]`; numeric ids sort before any other id, and the rest
/// sort lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|byte| byte.is_ascii_digit())
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_numeric(), other.is_numeric()) {
            (true, true) => {
                let lhs = self.0.trim_start_matches('0');
                let rhs = other.0.trim_start_matches('0');
                lhs.len()
                    .cmp(&rhs.len())
                    .then_with(|| lhs.cmp(rhs))
                    .then_with(|| self.0.cmp(&other.0))
            }
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How an entity's type and label are joined for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// `TYPE:label`
    #[default]
    Compact,
    /// `TYPE: label`
    Spaced,
}

impl LabelStyle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Spaced => "spaced",
        }
    }
}

impl FromStr for LabelStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "spaced" => Ok(Self::Spaced),
            other => Err(format!(
                "unknown label style '{other}' (expected 'compact' or 'spaced')"
            )),
        }
    }
}

/// A declared entity: category tag plus free-text label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Entity {
    pub entity_type: String,
    /// Verbatim label text after the type's `:`.
    pub label: String,
}

impl Entity {
    #[must_use]
    pub fn new(entity_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            label: label.into(),
        }
    }

    #[must_use]
    pub fn display_label(&self, style: LabelStyle) -> String {
        match style {
            LabelStyle::Compact => format!("{}:{}", self.entity_type, self.label),
            LabelStyle::Spaced => format!("{}: {}", self.entity_type, self.label.trim_start()),
        }
    }
}

/// A directed, labeled edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Relationship {
    pub source: EntityId,
    pub target: EntityId,
    pub relation: String,
}

impl Relationship {
    #[must_use]
    pub fn new(
        source: impl Into<EntityId>,
        target: impl Into<EntityId>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} [{}]", self.source, self.relation, self.target)
    }
}

/// One classified input record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Record {
    Entity { id: EntityId, entity: Entity },
    Relationship(Relationship),
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity { id, entity } => {
                write!(f, "[{id}], {}:{}", entity.entity_type, entity.label)
            }
            Self::Relationship(relationship) => relationship.fmt(f),
        }
    }
}

/// In- and out-edge counts of one node. Parallel edges count individually;
/// a self-loop counts once in each direction.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct NodeDegree {
    pub incoming: usize,
    pub outgoing: usize,
}

impl NodeDegree {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.incoming + self.outgoing
    }
}

/// Directed multigraph of declared entities and their relationships.
///
/// Every edge endpoint is a declared entity. Nodes iterate in [`EntityId`]
/// order and edges in (source, target, relation) order, so two graphs built
/// from the same records in any order compare equal.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct RelationGraph {
    nodes: BTreeMap<EntityId, Entity>,
    edges: Vec<Relationship>,
}

impl RelationGraph {
    /// Assemble a graph, rejecting the first edge (in the given order) whose
    /// source or target is not among `nodes`.
    pub fn try_new(
        nodes: BTreeMap<EntityId, Entity>,
        mut edges: Vec<Relationship>,
    ) -> Result<Self, DanglingReferenceError> {
        for edge in &edges {
            for endpoint in [&edge.source, &edge.target] {
                if !nodes.contains_key(endpoint) {
                    return Err(DanglingReferenceError {
                        relationship: edge.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }
        edges.sort();
        Ok(Self { nodes, edges })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn edges(&self) -> &[Relationship] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Entity> {
        self.nodes.get(&EntityId::new(id))
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Display label of a node, if it exists.
    #[must_use]
    pub fn display_label(&self, id: &EntityId, style: LabelStyle) -> Option<String> {
        self.nodes.get(id).map(|entity| entity.display_label(style))
    }

    #[must_use]
    pub fn in_degree(&self, id: &EntityId) -> usize {
        self.edges.iter().filter(|edge| &edge.target == id).count()
    }

    #[must_use]
    pub fn out_degree(&self, id: &EntityId) -> usize {
        self.edges.iter().filter(|edge| &edge.source == id).count()
    }

    /// In + out edge count, the visual weight signal for renderers.
    #[must_use]
    pub fn degree(&self, id: &EntityId) -> usize {
        self.in_degree(id) + self.out_degree(id)
    }

    /// Degrees of every node in one pass over the edges.
    #[must_use]
    pub fn degrees(&self) -> BTreeMap<&EntityId, NodeDegree> {
        let mut table: BTreeMap<&EntityId, NodeDegree> = self
            .nodes
            .keys()
            .map(|id| (id, NodeDegree::default()))
            .collect();
        for edge in &self.edges {
            if let Some(entry) = table.get_mut(&edge.source) {
                entry.outgoing += 1;
            }
            if let Some(entry) = table.get_mut(&edge.target) {
                entry.incoming += 1;
            }
        }
        table
    }

    #[must_use]
    pub fn max_degree(&self) -> usize {
        self.degrees()
            .values()
            .map(NodeDegree::total)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn entity_types(&self) -> BTreeSet<&str> {
        self.nodes
            .values()
            .map(|entity| entity.entity_type.as_str())
            .collect()
    }

    #[must_use]
    pub fn relation_names(&self) -> BTreeSet<&str> {
        self.edges.iter().map(|edge| edge.relation.as_str()).collect()
    }
}
