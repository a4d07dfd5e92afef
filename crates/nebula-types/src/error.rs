use thiserror::Error;
use uuid::Uuid;

use crate::record::RecordKind;

/// Errors from configuration loading and credential resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    #[error("invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from collection creation and schema validation.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("failed to create collection '{collection}': {message}")]
    CreateFailed { collection: String, message: String },

    #[error("collection '{collection}' references '{target}' which does not exist yet")]
    UnresolvedReference { collection: String, target: String },

    #[error(
        "collection '{collection}' has {actual_properties} properties and {actual_references} \
         references, expected {expected_properties} and {expected_references}"
    )]
    ShapeMismatch {
        collection: String,
        expected_properties: usize,
        actual_properties: usize,
        expected_references: usize,
        actual_references: usize,
    },

    #[error("collection '{0}' is missing")]
    MissingCollection(String),
}

/// Errors from record validation before vector preparation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{kind} record is missing required field '{field}'")]
    MissingField { kind: RecordKind, field: &'static str },

    #[error("supersession must point at another {kind} record, not the record itself")]
    SelfSupersession { kind: RecordKind },

    #[error("{kind} record is marked superseded but has no superseded_by pointer")]
    SupersededWithoutPointer { kind: RecordKind },

    #[error("{kind} records cannot be superseded by a {successor_kind} record")]
    SupersessionKindMismatch {
        kind: RecordKind,
        successor_kind: RecordKind,
    },

    #[error("{kind} records have no lifecycle status")]
    NoLifecycle { kind: RecordKind },
}

/// Errors from the embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding service returned an error: {0}")]
    Api(String),

    #[error("embedding has wrong dimension: expected {expected}, got {actual}")]
    WrongDimension { expected: usize, actual: usize },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Errors from data operations against the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    #[error("{kind} record {id} not found")]
    NotFound { kind: RecordKind, id: Uuid },

    #[error("store rejected operation on {kind}: {message}")]
    Rejected { kind: RecordKind, message: String },

    #[error("reference property '{reference}' is not declared on {kind}")]
    UnknownReference { kind: RecordKind, reference: String },

    #[error("text search requires store-side vectorization")]
    TextSearchUnsupported,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("malformed store response: {0}")]
    MalformedResponse(String),
}
