#![forbid(unsafe_code)]

mod graph_builder;
mod record_parser;
mod source;

use rg_core::{RelGraphError, RelationGraph};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

pub use graph_builder::{GraphBuilder, build_graph};
pub use record_parser::{parse_record, parse_records};
pub use source::{SourceRecord, load_records, looks_like_list_literal, parse_list_literal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub graph: RelationGraph,
    /// Non-fatal findings, e.g. redeclared entity ids.
    pub warnings: Vec<String>,
}

/// Parse an ordered sequence of record strings into a graph.
///
/// Stops at the first malformed record. Relationships are validated against
/// the full entity set, so record order does not matter.
pub fn parse<I, S>(records: I) -> Result<ParseResult, RelGraphError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let records = parse_records(records)?;
    Ok(build_graph(records)?)
}

/// Load records from a text source (list literal or plain lines) and parse
/// them. Errors and warnings name the source line of the record.
pub fn parse_source(input: &str) -> Result<ParseResult, RelGraphError> {
    let records = load_records(input)?;
    debug!(records = records.len(), "parsing record source");
    let mut builder = GraphBuilder::new();
    for (index, SourceRecord { line, text }) in records.into_iter().enumerate() {
        let record = parse_record(&text).map_err(|err| err.at(index).on_line(line))?;
        builder.add_record_on_line(record, line);
    }
    Ok(builder.finish()?)
}

/// Machine-readable summary of a parse.
#[must_use]
pub fn parse_evidence_json(parsed: &ParseResult) -> String {
    json!({
        "node_count": parsed.graph.node_count(),
        "edge_count": parsed.graph.edge_count(),
        "entity_types": parsed.graph.entity_types(),
        "relation_names": parsed.graph.relation_names(),
        "warning_count": parsed.warnings.len(),
        "warnings": parsed.warnings.clone(),
    })
    .to_string()
}
