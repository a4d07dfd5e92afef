//! Core logic for Nebula: the declarative schema catalog, deterministic
//! vector-text composition, the `Embedder` and `KnowledgeStore` trait
//! seams, and the `KnowledgeService` that ties them together.
//!
//! Implementations of the traits (Weaviate REST, Gemini embeddings,
//! in-memory test store) live in nebula-infra.

pub mod embedder;
pub mod schema;
pub mod service;
pub mod store;
pub mod vectorize;
