//! Embedding gateway boundary.
//!
//! The pipeline only sees [`EmbeddingProvider`]: a black-box mapping from
//! text to a fixed-length vector that may fail. [`HttpEmbeddingGateway`]
//! speaks to an external embedding service over HTTP;
//! [`MockEmbeddingProvider`] produces deterministic vectors for tests and
//! offline runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::types::StashError;

/// Black-box text-to-vector function. Output dimension is fixed per
/// provider/model and must match the target collection's dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text. Fails with [`StashError::Embedding`] when the
    /// gateway is unreachable or returns no usable vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StashError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GatewayResponse {
    embedding: Vec<f32>,
}

/// HTTP client for an external embedding service.
///
/// POSTs `{"model": ..., "prompt": ...}` to the configured endpoint and
/// expects `{"embedding": [..]}` back.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpEmbeddingGateway {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.endpoint.clone(), config.model.clone())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingGateway {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StashError> {
        let request = GatewayRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| StashError::Embedding(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StashError::Embedding(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let parsed: GatewayResponse = response
            .json()
            .await
            .map_err(|err| StashError::Embedding(format!("malformed response: {err}")))?;

        if parsed.embedding.is_empty() {
            return Err(StashError::Embedding(
                "gateway returned an empty vector".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Deterministic embedding provider for tests.
///
/// The same text always maps to the same vector; different texts map to
/// different vectors with overwhelming probability. No I/O, never fails.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimension: 8 }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StashError> {
        let mut state = text
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |acc, byte| {
                (acc ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            });

        let vector = (0..self.dimension)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 32) as u32) as f32 / u32::MAX as f32 - 0.5
            })
            .collect();

        Ok(vector)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
