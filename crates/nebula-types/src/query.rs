//! Query filters and search results.
//!
//! The [`Filter`] AST covers the predicate shapes the store supports:
//! property equality, wildcard match, tag containment, reference-by-id,
//! and conjunction. Store implementations translate it into their own
//! query language.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::KnowledgeRecord;

/// A predicate over record properties and references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Property equals a string value (enums compare by their string form).
    Eq { property: String, value: String },
    /// Property matches a `*`-wildcard pattern.
    Like { property: String, pattern: String },
    /// A text-array property contains any of the given values.
    ContainsAny { property: String, values: Vec<String> },
    /// A reference property points at the given record id.
    RefEq { reference: String, id: Uuid },
    /// All sub-filters hold.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(property: &str, value: impl ToString) -> Self {
        Filter::Eq {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn like(property: &str, pattern: &str) -> Self {
        Filter::Like {
            property: property.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn contains_any(property: &str, values: &[&str]) -> Self {
        Filter::ContainsAny {
            property: property.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn ref_eq(reference: &str, id: Uuid) -> Self {
        Filter::RefEq {
            reference: reference.to_string(),
            id,
        }
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }
}

/// One result of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub record: KnowledgeRecord,
    /// Cosine distance from the query vector (lower is closer).
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_flattens_chained_filters() {
        let f = Filter::eq("domain", "work")
            .and(Filter::eq("status", "active"))
            .and(Filter::contains_any("tags", &["ai-agents"]));

        match f {
            Filter::And(filters) => assert_eq!(filters.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_eq_stringifies_enum_values() {
        use crate::taxonomy::Domain;
        let f = Filter::eq("domain", Domain::Both);
        assert_eq!(
            f,
            Filter::Eq {
                property: "domain".to_string(),
                value: "both".to_string(),
            }
        );
    }

    #[test]
    fn test_filter_serde_roundtrip() {
        let f = Filter::ref_eq("involvesEntities", Uuid::now_v7())
            .and(Filter::like("title", "*Workshop*"));
        let json = serde_json::to_string(&f).unwrap();
        let parsed: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(f, parsed);
    }
}
