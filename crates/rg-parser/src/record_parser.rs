use chumsky::prelude::*;
use rg_core::{Entity, EntityId, MalformedRecordError, Record, Relationship};
use tracing::trace;

type ParserError<'a> = extra::Err<Rich<'a, char>>;

// ---------------------------------------------------------------------------
// Chumsky record grammar (character-level on &str)
// ---------------------------------------------------------------------------
// Both grammars run on one trimmed record. Relationship is tried first; a
// relation name may not contain `[ ] , :` so entity labels that end in a
// bracketed token still fall through to the entity grammar.

/// `[<id>]`, yielding the raw text between the brackets.
fn bracketed_id<'a>() -> impl Parser<'a, &'a str, &'a str, ParserError<'a>> {
    just('[')
        .ignore_then(
            any()
                .filter(|c: &char| !matches!(*c, '[' | ']'))
                .repeated()
                .to_slice(),
        )
        .then_ignore(just(']'))
}

/// `[<source>] <RELATION...> [<target>]`
fn relationship_parser<'a>()
-> impl Parser<'a, &'a str, (&'a str, &'a str, &'a str), ParserError<'a>> {
    let relation = any()
        .filter(|c: &char| !matches!(*c, '[' | ']' | ',' | ':'))
        .repeated()
        .to_slice();

    bracketed_id()
        .then(relation)
        .then(bracketed_id())
        .then_ignore(end())
        .map(|((source, relation), target)| (source, relation, target))
}

/// `[<id>], <TYPE>:<label>`
fn entity_parser<'a>() -> impl Parser<'a, &'a str, (&'a str, &'a str, &'a str), ParserError<'a>>
{
    let inline_ws = any().filter(|c: &char| *c == ' ' || *c == '\t').repeated();
    let entity_type = any().filter(|c: &char| *c != ':').repeated().to_slice();
    let label = any().repeated().to_slice();

    bracketed_id()
        .then_ignore(inline_ws)
        .then_ignore(just(','))
        .then(entity_type)
        .then_ignore(just(':'))
        .then(label)
        .then_ignore(end())
        .map(|((id, entity_type), label)| (id, entity_type, label))
}

/// Classify one record and extract its fields.
///
/// Surrounding whitespace is ignored. Relation names are normalized by
/// collapsing internal whitespace runs to a single space; entity labels are
/// kept verbatim.
pub fn parse_record(raw: &str) -> Result<Record, MalformedRecordError> {
    let record = raw.trim();
    if record.is_empty() {
        return Err(MalformedRecordError::new(record, "empty record"));
    }

    if let Ok((source, relation, target)) = relationship_parser().parse(record).into_result() {
        return lower_relationship(record, source, relation, target);
    }

    match entity_parser().parse(record).into_result() {
        Ok((id, entity_type, label)) => lower_entity(record, id, entity_type, label),
        Err(errors) => {
            let fallback = errors
                .first()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unrecognized record".to_string());
            Err(MalformedRecordError::new(
                record,
                diagnose(record).unwrap_or(fallback),
            ))
        }
    }
}

/// Parse an ordered sequence of records, stopping at the first malformed one.
pub fn parse_records<I, S>(records: I) -> Result<Vec<Record>, MalformedRecordError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| parse_record(raw.as_ref()).map_err(|err| err.at(index)))
        .collect::<Result<Vec<_>, _>>()?;
    trace!(records = parsed.len(), "classified records");
    Ok(parsed)
}

fn lower_relationship(
    record: &str,
    source: &str,
    relation: &str,
    target: &str,
) -> Result<Record, MalformedRecordError> {
    let source = non_empty_id(record, source, "source")?;
    let target = non_empty_id(record, target, "target")?;
    let relation = normalize_relation(relation);
    if relation.is_empty() {
        return Err(MalformedRecordError::new(
            record,
            "relationship has an empty relation name",
        ));
    }
    Ok(Record::Relationship(Relationship {
        source,
        target,
        relation,
    }))
}

fn lower_entity(
    record: &str,
    id: &str,
    entity_type: &str,
    label: &str,
) -> Result<Record, MalformedRecordError> {
    let id = non_empty_id(record, id, "entity")?;
    let entity_type = entity_type.trim();
    if entity_type.is_empty() {
        return Err(MalformedRecordError::new(
            record,
            "entity record has an empty type before ':'",
        ));
    }
    Ok(Record::Entity {
        id,
        entity: Entity::new(entity_type, label),
    })
}

fn non_empty_id(record: &str, raw: &str, role: &str) -> Result<EntityId, MalformedRecordError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(MalformedRecordError::new(
            record,
            format!("empty {role} identifier"),
        ));
    }
    Ok(EntityId::new(id))
}

fn normalize_relation(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-oriented reason for a record that neither grammar accepted.
fn diagnose(record: &str) -> Option<String> {
    let Some(after_open) = record.strip_prefix('[') else {
        return Some("record must start with a bracketed identifier '[id]'".to_string());
    };
    let Some(close) = after_open.find(']') else {
        return Some("unclosed '[' in identifier".to_string());
    };
    if after_open[..close].contains('[') {
        return Some("nested '[' inside identifier".to_string());
    }

    let rest = after_open[close + 1..].trim_start();
    if rest.is_empty() {
        return Some("expected ', TYPE:label' or 'RELATION [target]' after identifier".to_string());
    }
    if let Some(declaration) = rest.strip_prefix(',') {
        if !declaration.contains(':') {
            return Some("entity record is missing ':' between type and label".to_string());
        }
        return None;
    }
    if !rest.contains('[') {
        if rest.contains(':') {
            return Some("entity record is missing ',' after identifier".to_string());
        }
        return Some("relationship record is missing a bracketed target '[id]'".to_string());
    }
    if rest.contains(',') || rest.contains(':') {
        return Some("relation name may not contain ',' or ':'".to_string());
    }
    if !rest.ends_with(']') {
        return Some("unexpected text after relationship target".to_string());
    }
    None
}
