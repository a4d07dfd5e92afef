//! In-memory [`KnowledgeStore`] for tests and offline use.
//!
//! Mirrors the Weaviate store's observable behavior: collections must be
//! created in dependency order, reference properties must be declared,
//! similarity search is brute-force cosine distance, and dangling
//! reference edges are dropped at read time.

use std::collections::BTreeMap;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use nebula_core::schema::{expected_shape, CollectionShape, CollectionSpec};
use nebula_core::store::{BatchItem, CollectionStatus, KnowledgeStore};
use nebula_types::error::{SchemaError, StoreError};
use nebula_types::query::{Filter, SearchHit};
use nebula_types::record::{
    KnowledgeRecord, RecordKind, References, ResolvedReference, StoredRecord,
};

#[derive(Clone)]
struct StoredEntry {
    record: KnowledgeRecord,
    vector: Option<Vec<f32>>,
    references: References,
}

/// Knowledge store held entirely in process memory.
pub struct InMemoryStore {
    collections: DashMap<RecordKind, DashMap<Uuid, StoredEntry>>,
    shapes: DashMap<RecordKind, CollectionShape>,
    /// Stands in for a store-side vectorizer module; enables near_text.
    text_vectorizer: Option<fn(&str) -> Vec<f32>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            shapes: DashMap::new(),
            text_vectorizer: None,
        }
    }

    /// Enable text search with a deterministic vectorizer function.
    pub fn with_text_vectorizer(mut self, vectorizer: fn(&str) -> Vec<f32>) -> Self {
        self.text_vectorizer = Some(vectorizer);
        self
    }

    fn insert_entry(
        &self,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
        references: &References,
    ) -> Result<Uuid, StoreError> {
        let kind = record.kind();
        let collection = self
            .collections
            .get(&kind)
            .ok_or_else(|| SchemaError::MissingCollection(kind.collection_name().to_string()))?;
        for (ref_name, _) in references.iter() {
            if kind.reference_target(ref_name).is_none() {
                return Err(StoreError::UnknownReference {
                    kind,
                    reference: ref_name.to_string(),
                });
            }
        }
        let id = Uuid::now_v7();
        collection.insert(
            id,
            StoredEntry {
                record: record.clone(),
                vector: vector.map(<[f32]>::to_vec),
                references: references.clone(),
            },
        );
        Ok(id)
    }

    fn brute_force_near(
        &self,
        kind: RecordKind,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let collection = self
            .collections
            .get(&kind)
            .ok_or_else(|| SchemaError::MissingCollection(kind.collection_name().to_string()))?;
        let mut hits: Vec<SearchHit> = collection
            .iter()
            .filter_map(|entry| {
                entry.value().vector.as_ref().map(|v| SearchHit {
                    id: *entry.key(),
                    record: entry.value().record.clone(),
                    distance: cosine_distance(vector, v),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit);
        Ok(hits)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine distance between two vectors, 0.0 for identical directions.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Match a `*`-wildcard pattern against a string.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    if !text.starts_with(first) {
        return false;
    }
    let mut rest = &text[first.len()..];
    let mut segments: Vec<&str> = parts.collect();
    let Some(last) = segments.pop() else {
        // No wildcard in the pattern at all.
        return rest.is_empty();
    };
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

/// Look up one property of a record by its store-side name.
fn property_value(record: &KnowledgeRecord, property: &str) -> Option<serde_json::Value> {
    serde_json::to_value(record)
        .ok()?
        .get(property)
        .cloned()
}

fn matches_filter(entry: &StoredEntry, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { property, value } => property_value(&entry.record, property)
            .and_then(|v| v.as_str().map(|s| s == value))
            .unwrap_or(false),
        Filter::Like { property, pattern } => property_value(&entry.record, property)
            .and_then(|v| v.as_str().map(|s| wildcard_match(pattern, s)))
            .unwrap_or(false),
        Filter::ContainsAny { property, values } => property_value(&entry.record, property)
            .and_then(|v| {
                v.as_array().map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str())
                        .any(|i| values.iter().any(|v| v == i))
                })
            })
            .unwrap_or(false),
        Filter::RefEq { reference, id } => entry.references.get(reference).contains(id),
        Filter::And(filters) => filters.iter().all(|f| matches_filter(entry, f)),
    }
}

impl KnowledgeStore for InMemoryStore {
    async fn ensure_schema(&self, specs: &[CollectionSpec]) -> Result<(), SchemaError> {
        for spec in specs {
            if self.shapes.contains_key(&spec.kind) {
                debug!(collection = spec.name(), "collection already exists, skipping");
                continue;
            }
            for reference in &spec.references {
                if reference.target != spec.kind && !self.shapes.contains_key(&reference.target) {
                    return Err(SchemaError::UnresolvedReference {
                        collection: spec.name().to_string(),
                        target: reference.target.collection_name().to_string(),
                    });
                }
            }
            self.shapes.insert(
                spec.kind,
                CollectionShape {
                    properties: spec.properties.len(),
                    references: spec.references.len(),
                },
            );
            self.collections.insert(spec.kind, DashMap::new());
        }
        Ok(())
    }

    async fn validate_schema(&self) -> Result<Vec<CollectionStatus>, StoreError> {
        let mut statuses = Vec::with_capacity(RecordKind::CREATION_ORDER.len());
        for kind in RecordKind::CREATION_ORDER {
            let result = match self.shapes.get(&kind) {
                None => Err(SchemaError::MissingCollection(
                    kind.collection_name().to_string(),
                )),
                Some(shape) => {
                    let expected = expected_shape(kind);
                    if *shape == expected {
                        Ok(())
                    } else {
                        Err(SchemaError::ShapeMismatch {
                            collection: kind.collection_name().to_string(),
                            expected_properties: expected.properties,
                            actual_properties: shape.properties,
                            expected_references: expected.references,
                            actual_references: shape.references,
                        })
                    }
                }
            };
            statuses.push(CollectionStatus { kind, result });
        }
        Ok(statuses)
    }

    async fn insert(
        &self,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
        references: &References,
    ) -> Result<Uuid, StoreError> {
        self.insert_entry(record, vector, references)
    }

    async fn insert_batch(
        &self,
        items: &[BatchItem],
    ) -> Result<Vec<Result<Uuid, StoreError>>, StoreError> {
        Ok(items
            .iter()
            .map(|item| self.insert_entry(&item.record, item.vector.as_deref(), &item.references))
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
    ) -> Result<(), StoreError> {
        let kind = record.kind();
        let collection = self
            .collections
            .get(&kind)
            .ok_or_else(|| SchemaError::MissingCollection(kind.collection_name().to_string()))?;
        let mut entry = collection
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind, id })?;
        entry.record = record.clone();
        if let Some(vector) = vector {
            entry.vector = Some(vector.to_vec());
        }
        Ok(())
    }

    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<(), StoreError> {
        let collection = self
            .collections
            .get(&kind)
            .ok_or_else(|| SchemaError::MissingCollection(kind.collection_name().to_string()))?;
        collection
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { kind, id })
    }

    async fn get(
        &self,
        kind: RecordKind,
        id: Uuid,
        expand_references: bool,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let Some(collection) = self.collections.get(&kind) else {
            return Ok(None);
        };
        let Some(entry) = collection.get(&id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        drop(collection);

        let mut resolved = BTreeMap::new();
        if expand_references {
            for (ref_name, targets) in entry.references.iter() {
                let Some(target_kind) = kind.reference_target(ref_name) else {
                    continue;
                };
                let Some(target_collection) = self.collections.get(&target_kind) else {
                    continue;
                };
                let entries: Vec<ResolvedReference> = targets
                    .iter()
                    // Dangling edges are dropped rather than surfaced.
                    .filter_map(|target_id| {
                        target_collection.get(target_id).map(|target| ResolvedReference {
                            id: *target_id,
                            record: target.record.clone(),
                        })
                    })
                    .collect();
                resolved.insert(ref_name.to_string(), entries);
            }
        }

        Ok(Some(StoredRecord {
            id,
            record: entry.record,
            references: entry.references,
            resolved,
        }))
    }

    async fn list(
        &self,
        kind: RecordKind,
        filter: Option<&Filter>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let collection = self
            .collections
            .get(&kind)
            .ok_or_else(|| SchemaError::MissingCollection(kind.collection_name().to_string()))?;
        let mut records: Vec<StoredRecord> = collection
            .iter()
            .filter(|entry| filter.is_none_or(|f| matches_filter(entry.value(), f)))
            .map(|entry| StoredRecord {
                id: *entry.key(),
                record: entry.value().record.clone(),
                references: entry.value().references.clone(),
                resolved: BTreeMap::new(),
            })
            .collect();
        // Uuid v7 sorts by creation time.
        records.sort_by_key(|r| r.id);
        records.truncate(limit);
        Ok(records)
    }

    async fn near_vector(
        &self,
        kind: RecordKind,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.brute_force_near(kind, vector, limit)
    }

    async fn near_text(
        &self,
        kind: RecordKind,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let Some(vectorizer) = self.text_vectorizer else {
            return Err(StoreError::TextSearchUnsupported);
        };
        let vector = vectorizer(text);
        self.brute_force_near(kind, &vector, limit)
    }

    async fn add_reference(
        &self,
        kind: RecordKind,
        id: Uuid,
        reference: &str,
        target: Uuid,
    ) -> Result<(), StoreError> {
        if kind.reference_target(reference).is_none() {
            return Err(StoreError::UnknownReference {
                kind,
                reference: reference.to_string(),
            });
        }
        let collection = self
            .collections
            .get(&kind)
            .ok_or_else(|| SchemaError::MissingCollection(kind.collection_name().to_string()))?;
        let mut entry = collection
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind, id })?;
        entry.references.add(reference, target);
        Ok(())
    }

    async fn count(&self, kind: RecordKind) -> Result<u64, StoreError> {
        let collection = self
            .collections
            .get(&kind)
            .ok_or_else(|| SchemaError::MissingCollection(kind.collection_name().to_string()))?;
        Ok(collection.len() as u64)
    }

    async fn drop_all(&self) -> Result<(), StoreError> {
        self.collections.clear();
        self.shapes.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::hash::{DefaultHasher, Hash, Hasher};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;

    use nebula_core::embedder::{Embedder, EmbeddingMode};
    use nebula_core::schema::{collection_spec, collection_specs, Vectorizer};
    use nebula_core::service::{KnowledgeService, ServiceError};
    use nebula_core::vectorize::vector_text;
    use nebula_types::config::VectorSource;
    use nebula_types::error::{EmbeddingError, ValidationError};
    use nebula_types::record::{Entity, Event, Insight, Process, Strategy};
    use nebula_types::taxonomy::{
        Confidence, Domain, EntityStatus, EntityType, EventType, LifecycleStatus, SourceType,
        StrategyType,
    };

    const DIM: usize = 8;

    /// Deterministic text-to-vector mapping; identical text gives an
    /// identical vector, so distance 0 marks an exact match.
    fn fake_vector(text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();
        (0..DIM)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                ((seed >> 33) % 1000) as f32 / 1000.0 + 0.001
            })
            .collect()
    }

    struct FakeEmbedder {
        calls: Arc<AtomicUsize>,
    }

    impl FakeEmbedder {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl Embedder for FakeEmbedder {
        fn dimension(&self) -> usize {
            DIM
        }

        async fn embed(&self, text: &str, _mode: EmbeddingMode) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(fake_vector(text))
        }
    }

    fn entity(name: &str) -> KnowledgeRecord {
        KnowledgeRecord::Entity(Entity {
            name: name.to_string(),
            entity_type: EntityType::Company,
            domain: Domain::Work,
            description: Some("Big 4 consulting firm, potential AI services client.".to_string()),
            notes: Some("Risk-averse culture. Lead with compliance track record.".to_string()),
            status: EntityStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn strategy(title: &str) -> KnowledgeRecord {
        KnowledgeRecord::Strategy(Strategy {
            title: title.to_string(),
            content: "Position agent deployments as augmentation, not replacement.".to_string(),
            strategy_type: StrategyType::Goal,
            domain: Domain::Work,
            time_horizon: None,
            valid_from: None,
            valid_until: None,
            status: LifecycleStatus::Active,
            superseded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn insight(content: &str) -> KnowledgeRecord {
        KnowledgeRecord::Insight(Insight {
            content: content.to_string(),
            source_name: Some("Client call".to_string()),
            source_type: Some(SourceType::Conversation),
            domain: Domain::Work,
            tags: vec!["ai-agents".to_string(), "enterprise".to_string()],
            status: LifecycleStatus::Active,
            superseded_by: None,
            confidence: Some(Confidence::High),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn event(title: &str) -> KnowledgeRecord {
        KnowledgeRecord::Event(Event {
            title: title.to_string(),
            event_type: EventType::Meeting,
            summary: Some("Scoped a pilot for audit workflow automation.".to_string()),
            participants: vec!["Marie (Product)".to_string()],
            domain: Domain::Work,
            event_date: Some(Utc::now()),
            outcomes: Some("Agreed to a four-week pilot.".to_string()),
            action_items: None,
            open_questions: None,
            created_at: Utc::now(),
        })
    }

    fn process(title: &str) -> KnowledgeRecord {
        KnowledgeRecord::Process(Process {
            title: title.to_string(),
            content: "Review context, list open questions, draft an agenda.".to_string(),
            domain: Domain::Work,
            triggers: Some("The evening before any client meeting.".to_string()),
            status: LifecycleStatus::Active,
            superseded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    type Service = KnowledgeService<InMemoryStore, FakeEmbedder>;

    async fn service() -> (Service, Arc<AtomicUsize>) {
        let (embedder, calls) = FakeEmbedder::new();
        let service =
            KnowledgeService::new(InMemoryStore::new(), embedder, VectorSource::External);
        service.ensure_schema().await.unwrap();
        (service, calls)
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*Workshop*", "AI Workshop prep"));
        assert!(wildcard_match("KPMG*", "KPMG Sync"));
        assert!(wildcard_match("*Sync", "KPMG Sync"));
        assert!(wildcard_match("KPMG", "KPMG"));
        assert!(!wildcard_match("KPMG", "KPMG Sync"));
        assert!(!wildcard_match("*Review*", "KPMG Sync"));
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let (service, _) = service().await;
        service.ensure_schema().await.unwrap();

        let statuses = service.validate_schema().await.unwrap();
        assert_eq!(statuses.len(), 5);
        for status in statuses {
            assert!(status.result.is_ok(), "{} invalid", status.kind);
        }
    }

    #[tokio::test]
    async fn test_schema_creation_requires_dependency_order() {
        let store = InMemoryStore::new();
        let strategy_first = [collection_spec(RecordKind::Strategy, Vectorizer::None)];
        let err = store.ensure_schema(&strategy_first).await.unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedReference { .. }));
    }

    #[tokio::test]
    async fn test_validate_schema_reports_shape_mismatch() {
        let store = InMemoryStore::new();
        let mut specs = collection_specs(Vectorizer::None);
        specs[2].properties.truncate(4); // tamper with Insight
        store.ensure_schema(&specs).await.unwrap();

        let statuses = store.validate_schema().await.unwrap();
        let insight = statuses
            .iter()
            .find(|s| s.kind == RecordKind::Insight)
            .unwrap();
        assert!(matches!(
            insight.result,
            Err(SchemaError::ShapeMismatch { actual_properties: 4, .. })
        ));
        let entity = statuses
            .iter()
            .find(|s| s.kind == RecordKind::Entity)
            .unwrap();
        assert!(entity.result.is_ok());
    }

    #[tokio::test]
    async fn test_validate_schema_reports_missing_collections() {
        let store = InMemoryStore::new();
        let statuses = store.validate_schema().await.unwrap();
        assert!(statuses
            .iter()
            .all(|s| matches!(s.result, Err(SchemaError::MissingCollection(_)))));
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let (service, _) = service().await;
        let record = entity("KPMG");
        let id = service.create(record.clone(), References::new()).await.unwrap();

        let stored = service.get(RecordKind::Entity, id, false).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.record, record);
        assert!(service
            .get(RecordKind::Entity, Uuid::now_v7(), false)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reference_expansion_drops_dangling_edges() {
        let (service, _) = service().await;
        let kpmg = service.create(entity("KPMG"), References::new()).await.unwrap();
        let acme = service.create(entity("Acme"), References::new()).await.unwrap();

        let mut refs = References::new();
        refs.add("appliesToEntities", kpmg);
        refs.add("appliesToEntities", acme);
        let strat = service.create(strategy("Land and expand"), refs).await.unwrap();

        service.delete(RecordKind::Entity, acme).await.unwrap();

        let stored = service.get(RecordKind::Strategy, strat, true).await.unwrap().unwrap();
        // The edge list keeps both ids; resolution drops the deleted one.
        assert_eq!(stored.references.get("appliesToEntities").len(), 2);
        let resolved = &stored.resolved["appliesToEntities"];
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, kpmg);
        assert_eq!(resolved[0].record.label(), "KPMG");
    }

    #[tokio::test]
    async fn test_create_rejects_undeclared_reference() {
        let (service, _) = service().await;
        let target = service.create(entity("KPMG"), References::new()).await.unwrap();

        let refs = References::single("involvesEntities", target);
        let err = service.create(strategy("Broken"), refs).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::UnknownReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_superseded_without_pointer() {
        let (service, calls) = service().await;
        let mut record = strategy("Old direction");
        if let KnowledgeRecord::Strategy(s) = &mut record {
            s.status = LifecycleStatus::Superseded;
        }
        let err = service.create(record, References::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::SupersededWithoutPointer { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required_field() {
        let (service, calls) = service().await;
        let err = service.create(strategy("   "), References::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingField { field: "title", .. })
        ));
        // Nothing was embedded or stored.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.store().count(RecordKind::Strategy).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_batch_reports_per_item_outcomes() {
        let (service, _) = service().await;
        let items = vec![
            (entity("KPMG"), References::new()),
            (strategy(""), References::new()),
            (insight("Pilots close faster with a named sponsor."), References::new()),
        ];
        let outcomes = service.create_batch(items).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1],
            Err(ServiceError::Validation(ValidationError::MissingField { .. }))
        ));
        assert!(outcomes[2].is_ok());
        assert_eq!(service.store().count(RecordKind::Entity).await.unwrap(), 1);
        assert_eq!(service.store().count(RecordKind::Strategy).await.unwrap(), 0);
        assert_eq!(service.store().count(RecordKind::Insight).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_skips_reembedding_when_text_unchanged() {
        let (service, calls) = service().await;
        let id = service.create(entity("KPMG"), References::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Status does not feed the vector text.
        let mut record = entity("KPMG");
        if let KnowledgeRecord::Entity(e) = &mut record {
            e.status = EntityStatus::Inactive;
        }
        service.update(id, record).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A changed description does.
        let mut record = entity("KPMG");
        if let KnowledgeRecord::Entity(e) = &mut record {
            e.description = Some("Now an active client.".to_string());
        }
        service.update(id, record).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_touches_timestamp() {
        let (service, _) = service().await;
        let record = process("Meeting prep");
        let before = match &record {
            KnowledgeRecord::Process(p) => p.updated_at,
            _ => unreachable!(),
        };
        let id = service.create(record.clone(), References::new()).await.unwrap();
        service.update(id, record).await.unwrap();

        let stored = service.get(RecordKind::Process, id, false).await.unwrap().unwrap();
        match stored.record {
            KnowledgeRecord::Process(p) => assert!(p.updated_at > before),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_supersession_links_old_to_new() {
        let (service, _) = service().await;
        let old = service.create(strategy("Sell seats"), References::new()).await.unwrap();
        let new = service.create(strategy("Sell outcomes"), References::new()).await.unwrap();

        service.supersede(RecordKind::Strategy, old, new).await.unwrap();

        let stored = service.get(RecordKind::Strategy, old, false).await.unwrap().unwrap();
        let (status, superseded_by) = stored.record.lifecycle().unwrap();
        assert_eq!(status, LifecycleStatus::Superseded);
        assert_eq!(superseded_by, Some(new));
    }

    #[tokio::test]
    async fn test_supersession_rejects_self_and_missing_successor() {
        let (service, _) = service().await;
        let id = service.create(strategy("Only one"), References::new()).await.unwrap();

        let err = service.supersede(RecordKind::Strategy, id, id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::SelfSupersession { .. })
        ));

        let err = service
            .supersede(RecordKind::Strategy, id, Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_search_ranks_exact_content_first() {
        let (service, _) = service().await;
        service
            .create(insight("Budget cycles drive Q4 urgency."), References::new())
            .await
            .unwrap();
        service
            .create(insight("Champions need internal wins early."), References::new())
            .await
            .unwrap();
        let target = insight("Agent pilots succeed with narrow scope.");
        let target_id = service.create(target.clone(), References::new()).await.unwrap();

        // Querying with the stored record's exact vector text matches the
        // deterministic embedding, so the distance is zero.
        let query = vector_text(&target).unwrap();
        let hits = service.search(RecordKind::Insight, &query, 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, target_id);
        assert!(hits[0].distance < 1e-6);
        assert!(hits[1].distance > hits[0].distance);
    }

    #[tokio::test]
    async fn test_store_vectorization_mode() {
        let (embedder, calls) = FakeEmbedder::new();
        let store = InMemoryStore::new().with_text_vectorizer(fake_vector);
        let service = KnowledgeService::new(store, embedder, VectorSource::Store);
        service.ensure_schema().await.unwrap();

        // No document embedding happens on create.
        service.create(process("Weekly review"), References::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let hits = service.search(RecordKind::Process, "weekly", 5).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        // Store-vectorized records carry no client vector in memory, so
        // the search runs but cannot match this record.
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_near_text_requires_store_vectorizer() {
        let (embedder, _) = FakeEmbedder::new();
        let service =
            KnowledgeService::new(InMemoryStore::new(), embedder, VectorSource::Store);
        service.ensure_schema().await.unwrap();

        let err = service.search(RecordKind::Insight, "anything", 3).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::TextSearchUnsupported)
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (service, _) = service().await;
        service.create(event("KPMG Sync"), References::new()).await.unwrap();
        service.create(event("Acme Review"), References::new()).await.unwrap();

        let hits = service
            .list(RecordKind::Event, Some(&Filter::like("title", "KPMG*")), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.label(), "KPMG Sync");

        service
            .create(insight("Tagged insight"), References::new())
            .await
            .unwrap();
        let hits = service
            .list(
                RecordKind::Insight,
                Some(
                    &Filter::eq("domain", Domain::Work)
                        .and(Filter::contains_any("tags", &["enterprise"])),
                ),
                10,
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let hits = service
            .list(
                RecordKind::Insight,
                Some(&Filter::contains_any("tags", &["nonexistent"])),
                10,
            )
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_entity_context_gathers_linked_records() {
        let (service, _) = service().await;
        let kpmg = service.create(entity("KPMG"), References::new()).await.unwrap();
        service.create(entity("Acme"), References::new()).await.unwrap();

        let active = service
            .create(
                strategy("Lead with compliance"),
                References::single("appliesToEntities", kpmg),
            )
            .await
            .unwrap();
        let retired = service
            .create(
                strategy("Lead with price"),
                References::single("appliesToEntities", kpmg),
            )
            .await
            .unwrap();
        service.supersede(RecordKind::Strategy, retired, active).await.unwrap();

        service
            .create(event("KPMG Sync"), References::single("involvesEntities", kpmg))
            .await
            .unwrap();
        service
            .create(
                insight("KPMG moves slowly but commits fully."),
                References::single("relatedEntities", kpmg),
            )
            .await
            .unwrap();
        // Noise linked to nobody.
        service.create(event("Standalone workshop"), References::new()).await.unwrap();

        let context = service.entity_context("KPMG", 10).await.unwrap().unwrap();
        assert_eq!(context.entity.id, kpmg);
        assert_eq!(context.events.len(), 1);
        assert_eq!(context.insights.len(), 1);
        // The superseded strategy is filtered out.
        assert_eq!(context.strategies.len(), 1);
        assert_eq!(context.strategies[0].id, active);

        assert!(service.entity_context("Nonexistent", 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_reference_appears_in_expansion() {
        let (service, _) = service().await;
        let kpmg = service.create(entity("KPMG"), References::new()).await.unwrap();
        let id = service.create(event("KPMG Sync"), References::new()).await.unwrap();

        service
            .add_reference(RecordKind::Event, id, "involvesEntities", kpmg)
            .await
            .unwrap();

        let stored = service.get(RecordKind::Event, id, true).await.unwrap().unwrap();
        assert_eq!(stored.resolved["involvesEntities"][0].id, kpmg);

        let err = service
            .add_reference(RecordKind::Event, id, "appliesToEntities", kpmg)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::UnknownReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_stats_and_drop_all() {
        let (service, _) = service().await;
        service.create(entity("KPMG"), References::new()).await.unwrap();
        service.create(insight("One"), References::new()).await.unwrap();
        service.create(insight("Two"), References::new()).await.unwrap();

        let counts = service.stats().await.unwrap();
        let by_kind: std::collections::HashMap<RecordKind, u64> =
            counts.0.iter().copied().collect();
        assert_eq!(by_kind[&RecordKind::Entity], 1);
        assert_eq!(by_kind[&RecordKind::Insight], 2);
        assert_eq!(by_kind[&RecordKind::Process], 0);

        service.drop_all().await.unwrap();
        let statuses = service.validate_schema().await.unwrap();
        assert!(statuses.iter().all(|s| s.result.is_err()));
    }
}
