//! GeminiEmbedder -- concrete [`Embedder`] implementation for the Google
//! Generative Language embedding API (`text-embedding-004`).
//!
//! Sends requests to `:embedContent` / `:batchEmbedContents` with the
//! task type matching the embedding mode: RETRIEVAL_DOCUMENT for
//! storage, RETRIEVAL_QUERY for search.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only
//! exposed when building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use nebula_core::embedder::{Embedder, EmbeddingMode};
use nebula_types::config::EmbeddingConfig;
use nebula_types::error::EmbeddingError;

/// Google Generative Language embedding provider.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    dimension: usize,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder for the configured model.
    pub fn new(api_key: SecretString, config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self, action: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, action)
    }

    fn task_type(mode: EmbeddingMode) -> &'static str {
        match mode {
            EmbeddingMode::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingMode::Query => "RETRIEVAL_QUERY",
        }
    }

    fn build_request(&self, text: &str, mode: EmbeddingMode) -> EmbedContentRequest {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
            task_type: Self::task_type(mode),
        }
    }

    fn check_dimension(&self, values: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
        if values.len() != self.dimension {
            return Err(EmbeddingError::WrongDimension {
                expected: self.dimension,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, EmbeddingError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    model: String,
    content: Content,
    #[serde(rename = "taskType")]
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

impl Embedder for GeminiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<Vec<f32>, EmbeddingError> {
        let request = self.build_request(text, mode);
        let response: EmbedContentResponse =
            self.post(&self.url("embedContent"), &request).await?;
        self.check_dimension(response.embedding.values)
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| self.build_request(text, mode))
                .collect(),
        };
        let response: BatchEmbedResponse =
            self.post(&self.url("batchEmbedContents"), &request).await?;

        if response.embeddings.len() != texts.len() {
            return Err(EmbeddingError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        response
            .embeddings
            .into_iter()
            .map(|e| self.check_dimension(e.values))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> GeminiEmbedder {
        GeminiEmbedder::new(
            SecretString::from("test-key"),
            &EmbeddingConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let e = embedder();
        assert_eq!(
            e.url("embedContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn test_task_type_per_mode() {
        assert_eq!(
            GeminiEmbedder::task_type(EmbeddingMode::Document),
            "RETRIEVAL_DOCUMENT"
        );
        assert_eq!(
            GeminiEmbedder::task_type(EmbeddingMode::Query),
            "RETRIEVAL_QUERY"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let e = embedder();
        let request = e.build_request("hello", EmbeddingMode::Document);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "models/text-embedding-004");
        assert_eq!(json["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(json["content"]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_dimension_check_rejects_short_vector() {
        let e = embedder();
        let err = e.check_dimension(vec![0.1; 512]).unwrap_err();
        match err {
            EmbeddingError::WrongDimension { expected, actual } => {
                assert_eq!(expected, 768);
                assert_eq!(actual, 512);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"embedding": {"values": [0.1, 0.2, 0.3]}}"#;
        let parsed: EmbedContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.1, 0.2, 0.3]);

        let batch = r#"{"embeddings": [{"values": [1.0]}, {"values": [2.0]}]}"#;
        let parsed: BatchEmbedResponse = serde_json::from_str(batch).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
    }
}
