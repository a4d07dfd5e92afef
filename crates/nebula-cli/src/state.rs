//! Application state wiring the service to concrete infrastructure.
//!
//! The service is generic over store and embedder traits; AppState pins
//! it to the Weaviate store and the Gemini embedder.

use std::path::PathBuf;

use secrecy::SecretString;

use nebula_core::service::KnowledgeService;
use nebula_infra::config::{google_api_key, load_config, resolve_data_dir, weaviate_api_key};
use nebula_infra::embedding::GeminiEmbedder;
use nebula_infra::weaviate::WeaviateStore;
use nebula_types::config::VectorSource;

pub type ConcreteService = KnowledgeService<WeaviateStore, GeminiEmbedder>;

/// Shared application state holding the wired service.
pub struct AppState {
    pub service: ConcreteService,
    pub vector_source: VectorSource,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load config, resolve credentials, and wire the service.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await?;

        // The embedding key is only required when this process computes
        // vectors; with store-side vectorization the embedder is wired
        // but never called.
        let api_key = match config.vector_source {
            VectorSource::External => google_api_key()?,
            VectorSource::Store => {
                google_api_key().unwrap_or_else(|_| SecretString::from(""))
            }
        };
        let embedder = GeminiEmbedder::new(api_key, &config.embedding)?;
        let store = WeaviateStore::new(&config.weaviate, weaviate_api_key())?;

        Ok(Self {
            service: KnowledgeService::new(store, embedder, config.vector_source),
            vector_source: config.vector_source,
            data_dir,
        })
    }
}
