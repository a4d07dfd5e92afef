//! Weaviate-backed [`KnowledgeStore`] implementation.
//!
//! Talks to Weaviate over its REST API (`/v1/schema`, `/v1/objects`,
//! `/v1/batch/objects`) for schema and CRUD, and over `/v1/graphql` for
//! filtered fetch and similarity search.
//!
//! [`KnowledgeStore`]: nebula_core::store::KnowledgeStore

mod client;
mod graphql;
mod schema;
mod types;

pub use client::WeaviateStore;
