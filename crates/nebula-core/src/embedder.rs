//! Embedding generator trait.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).
//! Implementations (Gemini REST, test fakes) live in nebula-infra.

use nebula_types::error::EmbeddingError;

use std::fmt;

/// Which retrieval task the embedding is tuned for.
///
/// Document mode when storing a record, Query mode when searching.
/// Mixing them degrades retrieval quality, so callers pick explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    Document,
    Query,
}

impl fmt::Display for EmbeddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingMode::Document => write!(f, "document"),
            EmbeddingMode::Query => write!(f, "query"),
        }
    }
}

/// Trait for fixed-dimension text embedding.
pub trait Embedder: Send + Sync {
    /// The vector length this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a single text. Implementations must verify the returned
    /// vector has [`Self::dimension`] entries and surface a mismatch as
    /// [`EmbeddingError::WrongDimension`] rather than passing it through.
    fn embed(
        &self,
        text: &str,
        mode: EmbeddingMode,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// Embed several texts. The default embeds sequentially; providers
    /// with a batch endpoint override this.
    fn embed_batch(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text, mode).await?);
            }
            Ok(vectors)
        }
    }
}
