//! Infrastructure implementations for Nebula.
//!
//! Concrete backends for the nebula-core trait seams: the Weaviate REST
//! store, the Gemini embedding client, an in-memory store for tests, and
//! configuration loading.

pub mod config;
pub mod embedding;
pub mod memory;
pub mod weaviate;
