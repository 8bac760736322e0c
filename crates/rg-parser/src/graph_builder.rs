use std::collections::BTreeMap;

use rg_core::{DanglingReferenceError, Entity, EntityId, Record, RelationGraph, Relationship};
use tracing::debug;

use crate::ParseResult;

/// Collects classified records and assembles a [`RelationGraph`].
///
/// Relationships are only checked against the entity set in [`finish`], so
/// they may appear before the entities they reference.
///
/// [`finish`]: GraphBuilder::finish
#[derive(Debug, Default)]
pub struct GraphBuilder {
    entities: BTreeMap<EntityId, Entity>,
    relationships: Vec<Relationship>,
    warnings: Vec<String>,
    records_seen: usize,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: Record) {
        match record {
            Record::Entity { id, entity } => self.add_entity(id, entity),
            Record::Relationship(relationship) => self.add_relationship(relationship),
        }
    }

    /// Like [`add_record`](Self::add_record), but warnings name the source
    /// line instead of the record number.
    pub fn add_record_on_line(&mut self, record: Record, line: usize) {
        match record {
            Record::Entity { id, entity } => {
                self.records_seen += 1;
                self.declare(id, entity, &format!("Line {line}"));
            }
            Record::Relationship(relationship) => self.add_relationship(relationship),
        }
    }

    /// Declare an entity. A repeated id replaces the earlier type and label.
    pub fn add_entity(&mut self, id: EntityId, entity: Entity) {
        self.records_seen += 1;
        let position = format!("Record {}", self.records_seen);
        self.declare(id, entity, &position);
    }

    fn declare(&mut self, id: EntityId, entity: Entity, position: &str) {
        if let Some(previous) = self.entities.insert(id.clone(), entity) {
            debug!(
                id = %id,
                replaced_type = %previous.entity_type,
                "entity redeclared; later declaration wins"
            );
            self.warnings.push(format!(
                "{position}: entity [{id}] redeclared; later declaration wins"
            ));
        }
    }

    /// Declare a relationship. Duplicates and self-loops are kept.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.records_seen += 1;
        self.relationships.push(relationship);
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Validate every relationship against the complete entity set and hand
    /// out the finished graph.
    pub fn finish(self) -> Result<ParseResult, DanglingReferenceError> {
        let graph = RelationGraph::try_new(self.entities, self.relationships)?;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            warnings = self.warnings.len(),
            "built relation graph"
        );
        Ok(ParseResult {
            graph,
            warnings: self.warnings,
        })
    }
}

/// Build a graph from already classified records.
pub fn build_graph<I>(records: I) -> Result<ParseResult, DanglingReferenceError>
where
    I: IntoIterator<Item = Record>,
{
    let mut builder = GraphBuilder::new();
    for record in records {
        builder.add_record(record);
    }
    builder.finish()
}
