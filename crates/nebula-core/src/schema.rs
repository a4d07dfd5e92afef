//! Declarative collection specs for the five knowledge collections.
//!
//! One catalog serves both vectorization strategies: with
//! [`Vectorizer::None`] the caller supplies vectors on insert, with
//! [`Vectorizer::Text2VecTransformers`] the store vectorizes the
//! non-skipped text properties itself. Property lists and reference
//! edges are identical either way.

use nebula_types::record::RecordKind;

/// Data types a property can carry in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Text,
    TextArray,
    Date,
    Uuid,
}

/// Store-side vectorization module, or none for client-supplied vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vectorizer {
    None,
    Text2VecTransformers,
}

/// One property of a collection, with its indexing flags.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub name: &'static str,
    pub data_type: DataType,
    pub description: &'static str,
    pub filterable: bool,
    pub searchable: bool,
    /// Excluded from store-side vectorization. Ignored when the
    /// collection's vectorizer is [`Vectorizer::None`].
    pub skip_vectorization: bool,
}

impl PropertySpec {
    fn text(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            data_type: DataType::Text,
            description,
            filterable: false,
            searchable: true,
            skip_vectorization: false,
        }
    }

    /// Filterable metadata: not searchable, never vectorized.
    fn meta(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            data_type: DataType::Text,
            description,
            filterable: true,
            searchable: false,
            skip_vectorization: true,
        }
    }

    fn date(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            data_type: DataType::Date,
            description,
            filterable: true,
            searchable: false,
            skip_vectorization: true,
        }
    }

    fn uuid(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            data_type: DataType::Uuid,
            description,
            filterable: true,
            searchable: false,
            skip_vectorization: true,
        }
    }

    fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }
}

/// A typed reference edge to another collection.
#[derive(Debug, Clone)]
pub struct ReferenceSpec {
    pub name: &'static str,
    pub target: RecordKind,
    pub description: &'static str,
}

/// Full declarative description of one collection.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub kind: RecordKind,
    pub description: &'static str,
    pub properties: Vec<PropertySpec>,
    pub references: Vec<ReferenceSpec>,
    pub vectorizer: Vectorizer,
}

impl CollectionSpec {
    pub fn name(&self) -> &'static str {
        self.kind.collection_name()
    }
}

/// Expected shape of a collection, used by schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionShape {
    pub properties: usize,
    pub references: usize,
}

/// The expected property/reference counts per collection.
pub fn expected_shape(kind: RecordKind) -> CollectionShape {
    match kind {
        RecordKind::Entity => CollectionShape { properties: 8, references: 0 },
        RecordKind::Strategy => CollectionShape { properties: 11, references: 2 },
        RecordKind::Insight => CollectionShape { properties: 10, references: 3 },
        RecordKind::Event => CollectionShape { properties: 10, references: 3 },
        RecordKind::Process => CollectionShape { properties: 8, references: 2 },
    }
}

fn entity_spec(vectorizer: Vectorizer) -> CollectionSpec {
    CollectionSpec {
        kind: RecordKind::Entity,
        description:
            "Organizations, teams, products, projects, and people that appear in knowledge base",
        properties: vec![
            PropertySpec::text("name", "Display name of the entity").filterable(),
            PropertySpec::meta(
                "entity_type",
                "Type: company | team | product | project | conference | community | person",
            ),
            PropertySpec::meta("domain", "Domain filter: personal | work | both"),
            PropertySpec::text(
                "description",
                "Brief context about this entity - what it is, why it matters",
            ),
            PropertySpec::text(
                "notes",
                "Running notes: what works with them, preferences, history, quirks",
            ),
            PropertySpec::meta("status", "Lifecycle status: active | inactive | archived"),
            PropertySpec::date("created_at", "Creation timestamp"),
            PropertySpec::date("updated_at", "Last update timestamp"),
        ],
        references: vec![],
        vectorizer,
    }
}

fn strategy_spec(vectorizer: Vectorizer) -> CollectionSpec {
    CollectionSpec {
        kind: RecordKind::Strategy,
        description:
            "Goals, priorities, frameworks, principles, mental models - decision-making knowledge",
        properties: vec![
            PropertySpec::text("title", "Descriptive title").filterable(),
            PropertySpec::text(
                "content",
                "Full description of the strategy, framework, or principle",
            ),
            PropertySpec::meta(
                "strategy_type",
                "Type: goal | framework | principle | priority | mental_model | methodology",
            ),
            PropertySpec::meta("domain", "Domain filter: personal | work | both"),
            PropertySpec::meta(
                "time_horizon",
                "Timeframe: evergreen | quarterly | yearly | project-bound",
            ),
            PropertySpec::date("valid_from", "When this strategy becomes active"),
            PropertySpec::date("valid_until", "When this strategy expires (null = no expiry)"),
            PropertySpec::meta("status", "Lifecycle status: active | superseded | archived"),
            PropertySpec::uuid(
                "superseded_by",
                "Reference to newer Strategy UUID that replaces this one",
            ),
            PropertySpec::date("created_at", "Creation timestamp"),
            PropertySpec::date("updated_at", "Last update timestamp"),
        ],
        references: vec![
            ReferenceSpec {
                name: "appliesToEntities",
                target: RecordKind::Entity,
                description: "Entities this strategy applies to or involves",
            },
            ReferenceSpec {
                name: "relatedStrategies",
                target: RecordKind::Strategy,
                description: "Parent strategies, supporting frameworks, related goals",
            },
        ],
        vectorizer,
    }
}

fn insight_spec(vectorizer: Vectorizer) -> CollectionSpec {
    CollectionSpec {
        kind: RecordKind::Insight,
        description:
            "Atomic knowledge units - learnings, observations, ideas, patterns, mental models",
        properties: vec![
            PropertySpec::text("content", "The insight itself, written to be self-contained"),
            PropertySpec::text(
                "source_name",
                "Origin reference: article title, video name, book, conversation topic",
            )
            .filterable(),
            PropertySpec::meta(
                "source_type",
                "Type: article | video | book | podcast | conversation | reflection | research",
            ),
            PropertySpec::meta("domain", "Domain filter: personal | work | both"),
            PropertySpec {
                name: "tags",
                data_type: DataType::TextArray,
                description: "Flexible categorization for filtering",
                filterable: true,
                searchable: true,
                skip_vectorization: true,
            },
            PropertySpec::meta("status", "Lifecycle status: active | superseded | archived"),
            PropertySpec::uuid(
                "superseded_by",
                "Reference to newer Insight UUID that replaces this one",
            ),
            PropertySpec::meta("confidence", "Confidence level: high | medium | low | hypothesis"),
            PropertySpec::date("created_at", "Creation timestamp"),
            PropertySpec::date("updated_at", "Last update timestamp"),
        ],
        references: vec![
            ReferenceSpec {
                name: "relatedStrategies",
                target: RecordKind::Strategy,
                description: "Strategies this insight informs or supports",
            },
            ReferenceSpec {
                name: "relatedEntities",
                target: RecordKind::Entity,
                description: "Entities this insight relates to",
            },
            ReferenceSpec {
                name: "relatedInsights",
                target: RecordKind::Insight,
                description: "Other insights that connect to this one",
            },
        ],
        vectorizer,
    }
}

fn event_spec(vectorizer: Vectorizer) -> CollectionSpec {
    CollectionSpec {
        kind: RecordKind::Event,
        description:
            "Point-in-time occurrences - meetings, decisions, milestones, announcements",
        properties: vec![
            PropertySpec::text("title", "Event name").filterable(),
            PropertySpec::meta(
                "event_type",
                "Type: meeting | decision | milestone | announcement | workshop | review",
            ),
            PropertySpec::text("summary", "What happened - key discussion points, context"),
            PropertySpec {
                name: "participants",
                data_type: DataType::TextArray,
                description: "Names with optional context",
                filterable: true,
                searchable: true,
                skip_vectorization: true,
            },
            PropertySpec::meta("domain", "Domain filter: personal | work | both"),
            PropertySpec::date("event_date", "When this event occurred"),
            PropertySpec::text("outcomes", "Decisions made, conclusions reached"),
            PropertySpec::text("action_items", "Tasks assigned, next steps agreed"),
            PropertySpec::text("open_questions", "Unresolved items, parking lot topics"),
            PropertySpec::date("created_at", "Creation timestamp"),
        ],
        references: vec![
            ReferenceSpec {
                name: "involvesEntities",
                target: RecordKind::Entity,
                description: "Organizations/teams involved (not individual participants)",
            },
            ReferenceSpec {
                name: "relatesToStrategies",
                target: RecordKind::Strategy,
                description: "Strategies discussed or affected by this event",
            },
            ReferenceSpec {
                name: "generatedInsights",
                target: RecordKind::Insight,
                description: "Insights that emerged from this event",
            },
        ],
        vectorizer,
    }
}

fn process_spec(vectorizer: Vectorizer) -> CollectionSpec {
    CollectionSpec {
        kind: RecordKind::Process,
        description:
            "Procedures, workflows, how-tos - operational knowledge for recurring activities",
        properties: vec![
            PropertySpec::text("title", "Process name").filterable(),
            PropertySpec::text("content", "The process itself - steps, principles, checklist"),
            PropertySpec::meta("domain", "Domain filter: personal | work | both"),
            PropertySpec::text("triggers", "When to use this process: conditions, cues, schedules"),
            PropertySpec::meta("status", "Lifecycle status: active | superseded | archived"),
            PropertySpec::uuid(
                "superseded_by",
                "Reference to newer Process UUID that replaces this one",
            ),
            PropertySpec::date("created_at", "Creation timestamp"),
            PropertySpec::date("updated_at", "Last update timestamp"),
        ],
        references: vec![
            ReferenceSpec {
                name: "appliesToEntities",
                target: RecordKind::Entity,
                description: "Entities this process is used with",
            },
            ReferenceSpec {
                name: "relatedStrategies",
                target: RecordKind::Strategy,
                description: "Strategies this process supports or implements",
            },
        ],
        vectorizer,
    }
}

/// All five collection specs in dependency order: Entity, Strategy,
/// Insight, Event, Process. Creating in this order guarantees every
/// reference target already exists (self-references are permitted).
pub fn collection_specs(vectorizer: Vectorizer) -> Vec<CollectionSpec> {
    vec![
        entity_spec(vectorizer),
        strategy_spec(vectorizer),
        insight_spec(vectorizer),
        event_spec(vectorizer),
        process_spec(vectorizer),
    ]
}

/// The collection definition for a single kind.
pub fn collection_spec(kind: RecordKind, vectorizer: Vectorizer) -> CollectionSpec {
    match kind {
        RecordKind::Entity => entity_spec(vectorizer),
        RecordKind::Strategy => strategy_spec(vectorizer),
        RecordKind::Insight => insight_spec(vectorizer),
        RecordKind::Event => event_spec(vectorizer),
        RecordKind::Process => process_spec(vectorizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_follow_creation_order() {
        let specs = collection_specs(Vectorizer::None);
        let kinds: Vec<RecordKind> = specs.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, RecordKind::CREATION_ORDER);
    }

    #[test]
    fn test_specs_match_expected_shapes() {
        for spec in collection_specs(Vectorizer::None) {
            let shape = expected_shape(spec.kind);
            assert_eq!(
                spec.properties.len(),
                shape.properties,
                "property count for {}",
                spec.name()
            );
            assert_eq!(
                spec.references.len(),
                shape.references,
                "reference count for {}",
                spec.name()
            );
        }
    }

    #[test]
    fn test_reference_targets_already_created() {
        let specs = collection_specs(Vectorizer::None);
        for (idx, spec) in specs.iter().enumerate() {
            for reference in &spec.references {
                let target_idx = specs
                    .iter()
                    .position(|s| s.kind == reference.target)
                    .unwrap();
                assert!(
                    target_idx <= idx,
                    "{} -> {} is a forward reference",
                    spec.name(),
                    reference.target
                );
            }
        }
    }

    #[test]
    fn test_reference_specs_agree_with_record_kind() {
        for spec in collection_specs(Vectorizer::None) {
            let declared: Vec<(&str, RecordKind)> = spec
                .references
                .iter()
                .map(|r| (r.name, r.target))
                .collect();
            assert_eq!(declared, spec.kind.reference_targets());
        }
    }

    #[test]
    fn test_domain_is_filterable_everywhere() {
        for spec in collection_specs(Vectorizer::None) {
            let domain = spec
                .properties
                .iter()
                .find(|p| p.name == "domain")
                .unwrap_or_else(|| panic!("{} has no domain property", spec.name()));
            assert!(domain.filterable);
            assert!(!domain.searchable);
            assert!(domain.skip_vectorization);
        }
    }

    #[test]
    fn test_vectorized_fields_match_vector_text_inputs() {
        // Fields that feed vector_text must not be skipped when the store
        // vectorizes; metadata must be.
        let spec = entity_spec(Vectorizer::Text2VecTransformers);
        for prop in &spec.properties {
            match prop.name {
                "name" | "description" | "notes" => assert!(!prop.skip_vectorization),
                "domain" | "status" | "created_at" | "updated_at" => {
                    assert!(prop.skip_vectorization)
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_superseded_by_is_uuid_on_lifecycle_kinds() {
        for kind in [RecordKind::Strategy, RecordKind::Insight, RecordKind::Process] {
            let spec = collection_spec(kind, Vectorizer::None);
            let prop = spec
                .properties
                .iter()
                .find(|p| p.name == "superseded_by")
                .unwrap();
            assert_eq!(prop.data_type, DataType::Uuid);
        }
        let entity = collection_spec(RecordKind::Entity, Vectorizer::None);
        assert!(entity.properties.iter().all(|p| p.name != "superseded_by"));
    }
}
