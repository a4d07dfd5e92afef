//! Knowledge store trait.
//!
//! Defines the boundary to the external vector store: schema lifecycle,
//! CRUD, filtered fetch, and similarity search. Uses RPITIT (native
//! async fn in traits, Rust 2024 edition). Implementations live in
//! nebula-infra.

use uuid::Uuid;

use nebula_types::error::{SchemaError, StoreError};
use nebula_types::query::{Filter, SearchHit};
use nebula_types::record::{KnowledgeRecord, RecordKind, References, StoredRecord};

use crate::schema::CollectionSpec;

/// Per-collection result of a schema validation pass.
#[derive(Debug, Clone)]
pub struct CollectionStatus {
    pub kind: RecordKind,
    /// Ok when the collection exists with the expected shape.
    pub result: Result<(), SchemaError>,
}

/// One item of a batch insert.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub record: KnowledgeRecord,
    pub vector: Option<Vec<f32>>,
    pub references: References,
}

/// Trait for the external vector store.
///
/// Implementations hold a long-lived connection; none of these methods
/// open per-call connections.
pub trait KnowledgeStore: Send + Sync {
    /// Create all collections in dependency order. A collection that
    /// already exists is skipped (idempotent re-run); any other creation
    /// error aborts the remaining sequence, so a partial schema is
    /// possible and must be caught by [`Self::validate_schema`].
    fn ensure_schema(
        &self,
        specs: &[CollectionSpec],
    ) -> impl std::future::Future<Output = Result<(), SchemaError>> + Send;

    /// Re-read each collection and compare its declared property and
    /// reference counts against the expected shape.
    fn validate_schema(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<CollectionStatus>, StoreError>> + Send;

    /// Insert a record, returning the store-assigned identifier.
    /// `vector` is None when the store vectorizes records itself.
    fn insert(
        &self,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
        references: &References,
    ) -> impl std::future::Future<Output = Result<Uuid, StoreError>> + Send;

    /// Insert a batch. Returns one result per item in input order;
    /// a failed item never aborts the rest of the batch.
    fn insert_batch(
        &self,
        items: &[BatchItem],
    ) -> impl std::future::Future<Output = Result<Vec<Result<Uuid, StoreError>>, StoreError>> + Send;

    /// Replace a record's properties (and vector, when supplied).
    fn update(
        &self,
        id: Uuid,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete by identifier. No referential-integrity check: deleting a
    /// referenced record leaves dangling edges, which readers drop.
    fn delete(
        &self,
        kind: RecordKind,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Fetch one record, optionally resolving one level of references.
    fn get(
        &self,
        kind: RecordKind,
        id: Uuid,
        expand_references: bool,
    ) -> impl std::future::Future<Output = Result<Option<StoredRecord>, StoreError>> + Send;

    /// Fetch records matching a filter.
    fn list(
        &self,
        kind: RecordKind,
        filter: Option<&Filter>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<StoredRecord>, StoreError>> + Send;

    /// Nearest records by vector similarity.
    fn near_vector(
        &self,
        kind: RecordKind,
        vector: &[f32],
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SearchHit>, StoreError>> + Send;

    /// Nearest records by text. Only valid when the store vectorizes
    /// records itself; otherwise [`StoreError::TextSearchUnsupported`].
    fn near_text(
        &self,
        kind: RecordKind,
        text: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SearchHit>, StoreError>> + Send;

    /// Add a single reference edge to an existing record.
    fn add_reference(
        &self,
        kind: RecordKind,
        id: Uuid,
        reference: &str,
        target: Uuid,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Count records in a collection.
    fn count(
        &self,
        kind: RecordKind,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Drop every collection. Destructive; the CLI gates this behind a
    /// confirmation prompt.
    fn drop_all(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
