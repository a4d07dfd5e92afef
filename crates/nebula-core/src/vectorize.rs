//! Deterministic embedding-text composition.
//!
//! Each record kind contributes a fixed, ordered subset of its fields,
//! joined with `" | "`. Labeled prefixes keep the kinds distinguishable
//! in embedding space. Absent optional fields are skipped; missing
//! required fields fail here, before any network call.

use nebula_types::error::ValidationError;
use nebula_types::record::{Entity, Event, Insight, KnowledgeRecord, Process, Strategy};

const SEPARATOR: &str = " | ";

fn require<'a>(
    value: &'a str,
    kind: nebula_types::record::RecordKind,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { kind, field })
    } else {
        Ok(value)
    }
}

fn entity_text(entity: &Entity) -> Result<String, ValidationError> {
    use nebula_types::record::RecordKind::Entity as Kind;
    let name = require(&entity.name, Kind, "name")?;

    let mut parts = vec![
        format!("Entity: {name}"),
        format!("Type: {}", entity.entity_type),
    ];
    if let Some(description) = &entity.description {
        parts.push(description.clone());
    }
    if let Some(notes) = &entity.notes {
        parts.push(format!("Notes: {notes}"));
    }
    Ok(parts.join(SEPARATOR))
}

fn strategy_text(strategy: &Strategy) -> Result<String, ValidationError> {
    use nebula_types::record::RecordKind::Strategy as Kind;
    let title = require(&strategy.title, Kind, "title")?;
    let content = require(&strategy.content, Kind, "content")?;

    Ok([
        format!("Strategy: {title}"),
        format!("Type: {}", strategy.strategy_type),
        content.to_string(),
    ]
    .join(SEPARATOR))
}

fn insight_text(insight: &Insight) -> Result<String, ValidationError> {
    use nebula_types::record::RecordKind::Insight as Kind;
    let content = require(&insight.content, Kind, "content")?;

    match &insight.source_name {
        Some(source) => Ok(format!("{content}{SEPARATOR}Source: {source}")),
        None => Ok(content.to_string()),
    }
}

fn event_text(event: &Event) -> Result<String, ValidationError> {
    use nebula_types::record::RecordKind::Event as Kind;
    let title = require(&event.title, Kind, "title")?;

    let mut parts = vec![
        format!("Event: {title}"),
        format!("Type: {}", event.event_type),
    ];
    if let Some(summary) = &event.summary {
        parts.push(summary.clone());
    }
    if let Some(outcomes) = &event.outcomes {
        parts.push(format!("Outcomes: {outcomes}"));
    }
    Ok(parts.join(SEPARATOR))
}

fn process_text(process: &Process) -> Result<String, ValidationError> {
    use nebula_types::record::RecordKind::Process as Kind;
    let title = require(&process.title, Kind, "title")?;
    let content = require(&process.content, Kind, "content")?;

    let mut parts = vec![format!("Process: {title}"), content.to_string()];
    if let Some(triggers) = &process.triggers {
        parts.push(format!("When to use: {triggers}"));
    }
    Ok(parts.join(SEPARATOR))
}

/// Compose the embedding input text for a record.
///
/// Deterministic: identical records always produce identical text, so the
/// service layer can compare texts to decide whether an update needs
/// re-embedding.
pub fn vector_text(record: &KnowledgeRecord) -> Result<String, ValidationError> {
    match record {
        KnowledgeRecord::Entity(e) => entity_text(e),
        KnowledgeRecord::Strategy(s) => strategy_text(s),
        KnowledgeRecord::Insight(i) => insight_text(i),
        KnowledgeRecord::Event(e) => event_text(e),
        KnowledgeRecord::Process(p) => process_text(p),
    }
}
