//! Knowledge service: the orchestration layer over store and embedder.
//!
//! Owns the policy decisions the raw store does not make: when to embed
//! (and in which mode), when an update needs re-embedding, and what a
//! valid supersession looks like.

use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use nebula_types::config::VectorSource;
use nebula_types::error::{EmbeddingError, SchemaError, StoreError, ValidationError};
use nebula_types::query::{Filter, SearchHit};
use nebula_types::record::{KnowledgeRecord, RecordKind, References, StoredRecord};
use nebula_types::taxonomy::LifecycleStatus;

use crate::embedder::{Embedder, EmbeddingMode};
use crate::schema::{collection_specs, Vectorizer};
use crate::store::{BatchItem, CollectionStatus, KnowledgeStore};
use crate::vectorize::vector_text;

/// Any failure surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// All knowledge linked to one entity, gathered for preparation flows.
#[derive(Debug, Clone)]
pub struct EntityContext {
    pub entity: StoredRecord,
    pub events: Vec<StoredRecord>,
    pub strategies: Vec<StoredRecord>,
    pub insights: Vec<StoredRecord>,
}

/// Record counts per collection.
#[derive(Debug, Clone)]
pub struct CollectionCounts(pub Vec<(RecordKind, u64)>);

/// Orchestrates embedding and store operations for knowledge records.
pub struct KnowledgeService<S, E> {
    store: S,
    embedder: E,
    vector_source: VectorSource,
}

impl<S: KnowledgeStore, E: Embedder> KnowledgeService<S, E> {
    pub fn new(store: S, embedder: E, vector_source: VectorSource) -> Self {
        Self {
            store,
            embedder,
            vector_source,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn vectorizer(&self) -> Vectorizer {
        match self.vector_source {
            VectorSource::External => Vectorizer::None,
            VectorSource::Store => Vectorizer::Text2VecTransformers,
        }
    }

    /// Create all collections in dependency order; safe to re-run.
    pub async fn ensure_schema(&self) -> Result<(), ServiceError> {
        let specs = collection_specs(self.vectorizer());
        self.store.ensure_schema(&specs).await?;
        Ok(())
    }

    /// Compare each collection's shape against the catalog.
    pub async fn validate_schema(&self) -> Result<Vec<CollectionStatus>, ServiceError> {
        Ok(self.store.validate_schema().await?)
    }

    /// Validate lifecycle invariants that hold regardless of storage.
    fn check_lifecycle(record: &KnowledgeRecord) -> Result<(), ValidationError> {
        if let Some((LifecycleStatus::Superseded, None)) = record.lifecycle() {
            return Err(ValidationError::SupersededWithoutPointer {
                kind: record.kind(),
            });
        }
        Ok(())
    }

    /// Compose and embed the record's vector text in Document mode.
    async fn document_vector(&self, record: &KnowledgeRecord) -> Result<Vec<f32>, ServiceError> {
        let text = vector_text(record)?;
        Ok(self.embedder.embed(&text, EmbeddingMode::Document).await?)
    }

    /// Insert a record, embedding it first unless the store vectorizes.
    ///
    /// Referenced records must already exist; the store rejects edges to
    /// unknown targets.
    pub async fn create(
        &self,
        record: KnowledgeRecord,
        references: References,
    ) -> Result<Uuid, ServiceError> {
        Self::check_lifecycle(&record)?;
        let vector = match self.vector_source {
            VectorSource::External => Some(self.document_vector(&record).await?),
            VectorSource::Store => {
                // Validation still runs so a broken record fails here,
                // not inside the store.
                vector_text(&record)?;
                None
            }
        };
        let id = self
            .store
            .insert(&record, vector.as_deref(), &references)
            .await?;
        debug!(kind = %record.kind(), %id, "created record");
        Ok(id)
    }

    /// Insert a batch, reporting one outcome per item in input order.
    ///
    /// Items that fail validation or embedding are reported individually
    /// and never abort the rest of the batch.
    pub async fn create_batch(
        &self,
        items: Vec<(KnowledgeRecord, References)>,
    ) -> Result<Vec<Result<Uuid, ServiceError>>, ServiceError> {
        let mut outcomes: Vec<Option<Result<Uuid, ServiceError>>> = Vec::new();
        let mut ready: Vec<(usize, BatchItem)> = Vec::new();

        for (idx, (record, references)) in items.into_iter().enumerate() {
            outcomes.push(None);
            let prepared = match Self::check_lifecycle(&record) {
                Ok(()) => match self.vector_source {
                    VectorSource::External => match self.document_vector(&record).await {
                        Ok(vector) => Ok(Some(vector)),
                        Err(err) => Err(err),
                    },
                    VectorSource::Store => vector_text(&record)
                        .map(|_| None)
                        .map_err(ServiceError::from),
                },
                Err(err) => Err(err.into()),
            };
            match prepared {
                Ok(vector) => ready.push((
                    idx,
                    BatchItem {
                        record,
                        vector,
                        references,
                    },
                )),
                Err(err) => outcomes[idx] = Some(Err(err)),
            }
        }

        if !ready.is_empty() {
            let batch: Vec<BatchItem> = ready.iter().map(|(_, item)| item.clone()).collect();
            let results = self.store.insert_batch(&batch).await?;
            if results.len() != batch.len() {
                return Err(StoreError::MalformedResponse(format!(
                    "batch insert returned {} results for {} objects",
                    results.len(),
                    batch.len()
                ))
                .into());
            }
            for ((idx, _), result) in ready.into_iter().zip(results) {
                outcomes[idx] = Some(result.map_err(ServiceError::from));
            }
        }

        // Every slot was filled either by a validation failure above or by
        // the store's per-item result.
        Ok(outcomes
            .into_iter()
            .flatten()
            .collect())
    }

    /// Fetch one record, optionally with one level of resolved references.
    pub async fn get(
        &self,
        kind: RecordKind,
        id: Uuid,
        expand_references: bool,
    ) -> Result<Option<StoredRecord>, ServiceError> {
        Ok(self.store.get(kind, id, expand_references).await?)
    }

    /// Fetch records matching a filter.
    pub async fn list(
        &self,
        kind: RecordKind,
        filter: Option<&Filter>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, ServiceError> {
        Ok(self.store.list(kind, filter, limit).await?)
    }

    /// Replace a record's properties, re-embedding only when the fields
    /// that feed the vector actually changed.
    pub async fn update(
        &self,
        id: Uuid,
        mut record: KnowledgeRecord,
    ) -> Result<(), ServiceError> {
        let kind = record.kind();
        Self::check_lifecycle(&record)?;
        let existing = self
            .store
            .get(kind, id, false)
            .await?
            .ok_or(StoreError::NotFound { kind, id })?;

        record.touch(Utc::now());
        let new_text = vector_text(&record)?;
        let vector = match self.vector_source {
            VectorSource::Store => None,
            VectorSource::External => {
                let old_text = vector_text(&existing.record)?;
                if old_text == new_text {
                    debug!(%id, "vectorized fields unchanged, keeping existing vector");
                    None
                } else {
                    Some(self.embedder.embed(&new_text, EmbeddingMode::Document).await?)
                }
            }
        };
        self.store.update(id, &record, vector.as_deref()).await?;
        Ok(())
    }

    /// Mark a record as superseded by a newer record of the same kind.
    ///
    /// Rejects self-cycles, kind mismatches, kinds without a lifecycle,
    /// and successors that do not exist.
    pub async fn supersede(
        &self,
        kind: RecordKind,
        id: Uuid,
        successor_id: Uuid,
    ) -> Result<(), ServiceError> {
        if id == successor_id {
            return Err(ValidationError::SelfSupersession { kind }.into());
        }
        let successor = self
            .store
            .get(kind, successor_id, false)
            .await?
            .ok_or(StoreError::NotFound {
                kind,
                id: successor_id,
            })?;
        if successor.record.kind() != kind {
            return Err(ValidationError::SupersessionKindMismatch {
                kind,
                successor_kind: successor.record.kind(),
            }
            .into());
        }

        let mut current = self
            .store
            .get(kind, id, false)
            .await?
            .ok_or(StoreError::NotFound { kind, id })?;

        let Some((status, superseded_by)) = current.record.lifecycle_mut() else {
            return Err(ValidationError::NoLifecycle { kind }.into());
        };
        *status = LifecycleStatus::Superseded;
        *superseded_by = Some(successor_id);
        current.record.touch(Utc::now());

        // Lifecycle fields never feed the vector, so no re-embed.
        self.store.update(id, &current.record, None).await?;
        Ok(())
    }

    /// Delete by identifier. Dangling references to the deleted record
    /// are allowed and dropped by readers at expansion time.
    pub async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.store.delete(kind, id).await?)
    }

    /// Similarity search over one collection.
    pub async fn search(
        &self,
        kind: RecordKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        match self.vector_source {
            VectorSource::External => {
                let vector = self.embedder.embed(query, EmbeddingMode::Query).await?;
                Ok(self.store.near_vector(kind, &vector, limit).await?)
            }
            VectorSource::Store => Ok(self.store.near_text(kind, query, limit).await?),
        }
    }

    /// Add a reference edge to an existing record.
    pub async fn add_reference(
        &self,
        kind: RecordKind,
        id: Uuid,
        reference: &str,
        target: Uuid,
    ) -> Result<(), ServiceError> {
        Ok(self.store.add_reference(kind, id, reference, target).await?)
    }

    /// Gather everything linked to an entity by name: recent events,
    /// active strategies, and related insights.
    pub async fn entity_context(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<Option<EntityContext>, ServiceError> {
        let mut entities = self
            .store
            .list(RecordKind::Entity, Some(&Filter::eq("name", name)), 1)
            .await?;
        let Some(entity) = entities.pop() else {
            return Ok(None);
        };

        let events = self
            .store
            .list(
                RecordKind::Event,
                Some(&Filter::ref_eq("involvesEntities", entity.id)),
                limit,
            )
            .await?;
        let strategies = self
            .store
            .list(
                RecordKind::Strategy,
                Some(
                    &Filter::ref_eq("appliesToEntities", entity.id)
                        .and(Filter::eq("status", LifecycleStatus::Active)),
                ),
                limit,
            )
            .await?;
        let insights = self
            .store
            .list(
                RecordKind::Insight,
                Some(&Filter::ref_eq("relatedEntities", entity.id)),
                limit,
            )
            .await?;

        Ok(Some(EntityContext {
            entity,
            events,
            strategies,
            insights,
        }))
    }

    /// Record counts for every collection, in creation order.
    pub async fn stats(&self) -> Result<CollectionCounts, ServiceError> {
        let mut counts = Vec::with_capacity(RecordKind::CREATION_ORDER.len());
        for kind in RecordKind::CREATION_ORDER {
            counts.push((kind, self.store.count(kind).await?));
        }
        Ok(CollectionCounts(counts))
    }

    /// Drop every collection.
    pub async fn drop_all(&self) -> Result<(), ServiceError> {
        Ok(self.store.drop_all().await?)
    }
}
