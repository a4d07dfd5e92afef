//! Configuration types for Nebula.
//!
//! Deserialized from an optional `config.toml` and then overridden by
//! environment variables; credentials are never stored here (they come
//! from the environment as `SecretString` at wiring time).

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Where record vectors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorSource {
    /// Vectors are computed by an external embedding API and passed to the
    /// store on insert; searches embed the query text client-side.
    External,
    /// The store vectorizes records itself (text2vec module); inserts carry
    /// no vector and searches go through near-text.
    Store,
}

impl Default for VectorSource {
    fn default() -> Self {
        VectorSource::External
    }
}

impl fmt::Display for VectorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorSource::External => write!(f, "external"),
            VectorSource::Store => write!(f, "store"),
        }
    }
}

impl FromStr for VectorSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "external" => Ok(VectorSource::External),
            "store" => Ok(VectorSource::Store),
            other => Err(format!("invalid vector source: '{other}'")),
        }
    }
}

/// Connection settings for the vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaviateConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8081,
        }
    }
}

impl WeaviateConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
            dimension: 768,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NebulaConfig {
    pub weaviate: WeaviateConfig,
    pub embedding: EmbeddingConfig,
    pub vector_source: VectorSource,
}
