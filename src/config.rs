//! Explicit configuration for the store and gateway handles.
//!
//! Nothing here is ambient: components take these values through their
//! constructors. `from_env` helpers exist for binaries that want the
//! conventional `.env` contract, but the rest of the crate never reads
//! the environment on its own.

use std::path::PathBuf;

use serde::Deserialize;

/// Where the document store keeps its database file.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Resolve from `CHUNKSTASH_DB`, defaulting to `chunkstash.db`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let db_path = std::env::var("CHUNKSTASH_DB").unwrap_or_else(|_| "chunkstash.db".to_string());
        Self::new(db_path)
    }
}

/// Endpoint and model identifier for the external embedding gateway.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayConfig {
    /// Full URL the embedding request is POSTed to.
    pub endpoint: String,
    /// Model identifier forwarded with every request.
    pub model: String,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Resolve from `EMBEDDING_ENDPOINT` and `EMBEDDING_MODEL_ID`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let endpoint = std::env::var("EMBEDDING_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:11434/api/embeddings".to_string());
        let model =
            std::env::var("EMBEDDING_MODEL_ID").unwrap_or_else(|_| "nomic-embed-text".to_string());
        Self::new(endpoint, model)
    }
}
