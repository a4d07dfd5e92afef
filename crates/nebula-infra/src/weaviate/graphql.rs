//! GraphQL query construction for Weaviate's `/v1/graphql` endpoint.
//!
//! Filtered fetch and similarity search both go through `Get` queries;
//! counts go through `Aggregate`. The [`Filter`] AST renders to
//! Weaviate's `where` operator syntax.

use serde_json::Value;

use nebula_core::schema::{collection_spec, Vectorizer};
use nebula_types::error::StoreError;
use nebula_types::query::Filter;
use nebula_types::record::RecordKind;

/// The similarity clause of a `Get` query.
pub(crate) enum NearClause<'a> {
    Vector(&'a [f32]),
    Text(&'a str),
}

/// A GraphQL string literal. JSON string escaping is a subset of
/// GraphQL's, so serde_json produces a valid literal.
fn string_literal(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn string_list_literal(values: &[String]) -> String {
    let literals: Vec<String> = values.iter().map(|v| string_literal(v)).collect();
    format!("[{}]", literals.join(", "))
}

/// Render a filter as a Weaviate `where` operand.
pub(crate) fn render_filter(kind: RecordKind, filter: &Filter) -> Result<String, StoreError> {
    match filter {
        Filter::Eq { property, value } => Ok(format!(
            "{{path: [{}], operator: Equal, valueText: {}}}",
            string_literal(property),
            string_literal(value),
        )),
        Filter::Like { property, pattern } => Ok(format!(
            "{{path: [{}], operator: Like, valueText: {}}}",
            string_literal(property),
            string_literal(pattern),
        )),
        Filter::ContainsAny { property, values } => Ok(format!(
            "{{path: [{}], operator: ContainsAny, valueText: {}}}",
            string_literal(property),
            string_list_literal(values),
        )),
        Filter::RefEq { reference, id } => {
            let target = kind.reference_target(reference).ok_or_else(|| {
                StoreError::UnknownReference {
                    kind,
                    reference: reference.clone(),
                }
            })?;
            Ok(format!(
                "{{path: [{}, {}, \"id\"], operator: Equal, valueText: {}}}",
                string_literal(reference),
                string_literal(target.collection_name()),
                string_literal(&id.to_string()),
            ))
        }
        Filter::And(filters) => {
            let operands: Result<Vec<String>, StoreError> = filters
                .iter()
                .map(|f| render_filter(kind, f))
                .collect();
            Ok(format!(
                "{{operator: And, operands: [{}]}}",
                operands?.join(", ")
            ))
        }
    }
}

/// Scalar property names to select for one collection.
fn field_selection(kind: RecordKind) -> String {
    collection_spec(kind, Vectorizer::None)
        .properties
        .iter()
        .map(|p| p.name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a `Get` query over one collection. Distance is only selected
/// for similarity queries, where Weaviate defines it.
pub(crate) fn get_query(
    kind: RecordKind,
    filter: Option<&Filter>,
    near: Option<NearClause<'_>>,
    limit: usize,
) -> Result<String, StoreError> {
    let mut arguments = vec![format!("limit: {limit}")];
    if let Some(filter) = filter {
        arguments.push(format!("where: {}", render_filter(kind, filter)?));
    }
    let additional = match &near {
        Some(NearClause::Vector(vector)) => {
            let rendered = serde_json::to_string(vector)
                .map_err(|e| StoreError::Request(e.to_string()))?;
            arguments.push(format!("nearVector: {{vector: {rendered}}}"));
            "_additional { id distance }"
        }
        Some(NearClause::Text(text)) => {
            arguments.push(format!(
                "nearText: {{concepts: [{}]}}",
                string_literal(text)
            ));
            "_additional { id distance }"
        }
        None => "_additional { id }",
    };

    Ok(format!(
        "{{ Get {{ {}({}) {{ {} {} }} }} }}",
        kind.collection_name(),
        arguments.join(", "),
        field_selection(kind),
        additional,
    ))
}

/// Build an `Aggregate` query returning the object count.
pub(crate) fn count_query(kind: RecordKind) -> String {
    format!(
        "{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}",
        kind.collection_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_eq_filter_rendering() {
        let rendered = render_filter(RecordKind::Entity, &Filter::eq("domain", "work")).unwrap();
        assert_eq!(
            rendered,
            r#"{path: ["domain"], operator: Equal, valueText: "work"}"#
        );
    }

    #[test]
    fn test_ref_filter_includes_target_class() {
        let id = Uuid::now_v7();
        let rendered =
            render_filter(RecordKind::Event, &Filter::ref_eq("involvesEntities", id)).unwrap();
        assert_eq!(
            rendered,
            format!(r#"{{path: ["involvesEntities", "Entity", "id"], operator: Equal, valueText: "{id}"}}"#)
        );
    }

    #[test]
    fn test_ref_filter_unknown_reference() {
        let err = render_filter(
            RecordKind::Entity,
            &Filter::ref_eq("involvesEntities", Uuid::now_v7()),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::UnknownReference { .. }));
    }

    #[test]
    fn test_and_filter_nests_operands() {
        let filter = Filter::eq("domain", "work").and(Filter::eq("status", "active"));
        let rendered = render_filter(RecordKind::Strategy, &filter).unwrap();
        assert!(rendered.starts_with("{operator: And, operands: ["));
        assert!(rendered.contains(r#"valueText: "active""#));
    }

    #[test]
    fn test_contains_any_renders_list() {
        let filter = Filter::contains_any("tags", &["ai-agents", "knowledge-management"]);
        let rendered = render_filter(RecordKind::Insight, &filter).unwrap();
        assert!(rendered.contains(r#"valueText: ["ai-agents", "knowledge-management"]"#));
    }

    #[test]
    fn test_get_query_plain_list() {
        let query = get_query(RecordKind::Entity, None, None, 5).unwrap();
        assert!(query.starts_with("{ Get { Entity(limit: 5)"));
        assert!(query.contains("name entity_type domain"));
        assert!(query.contains("_additional { id }"));
        assert!(!query.contains("distance"));
    }

    #[test]
    fn test_get_query_near_vector_selects_distance() {
        let vector = vec![0.25, -0.5];
        let query = get_query(
            RecordKind::Insight,
            None,
            Some(NearClause::Vector(&vector)),
            3,
        )
        .unwrap();
        assert!(query.contains("nearVector: {vector: [0.25,-0.5]}"));
        assert!(query.contains("_additional { id distance }"));
    }

    #[test]
    fn test_get_query_near_text_quotes_concepts() {
        let query = get_query(
            RecordKind::Process,
            None,
            Some(NearClause::Text("meeting \"prep\"")),
            3,
        )
        .unwrap();
        assert!(query.contains(r#"nearText: {concepts: ["meeting \"prep\""]}"#));
    }

    #[test]
    fn test_count_query() {
        assert_eq!(
            count_query(RecordKind::Event),
            "{ Aggregate { Event { meta { count } } } }"
        );
    }
}
