//! Ingestion, search, and deletion orchestration.
//!
//! [`DocumentPipeline`] wires an [`EmbeddingProvider`] to a
//! [`DocumentStore`] and owns the operation semantics: re-ingesting a
//! `document_id` replaces its previous chunk set atomically, search echoes
//! the conditions it ran under, and predicate deletes offer a dry run.

use std::sync::Arc;

use crate::chunking::chunk_text;
use crate::embeddings::EmbeddingProvider;
use crate::stores::DocumentStore;
use crate::types::{
    AttributeMap, DOCUMENT_ID_KEY, DeleteOutcome, DeleteRequest, EmbedResponse, IngestReceipt,
    IngestRequest, NewChunk, QueryConditions, SearchRequest, SearchResponse, StashError,
};

/// Orchestrator over one store and one embedding provider.
///
/// Holds both behind `Arc`, so clones share the same backends.
#[derive(Clone)]
pub struct DocumentPipeline {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl DocumentPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Chunk, embed, and store a document, superseding any previous chunk
    /// set carrying the same `document_id`.
    ///
    /// All chunks are embedded before anything is written; the write
    /// itself is a single transactional replacement. A failed embedding
    /// therefore leaves the previously stored document untouched.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReceipt, StashError> {
        let document_id = require_document_id(&request.attributes)?;

        if request.document_text.trim().is_empty() {
            return Err(StashError::Validation(
                "document_text must not be empty".to_string(),
            ));
        }

        let chunks = if request.chunk {
            let max_chunk_len = usize::try_from(request.chunk_size).unwrap_or(0);
            let overlap = usize::try_from(request.overlap).unwrap_or(0);
            chunk_text(&request.document_text, max_chunk_len, overlap)
        } else {
            vec![request.document_text.trim().to_string()]
        };

        tracing::debug!(
            document_id = %document_id,
            collection = %request.collection,
            chunk_count = chunks.len(),
            provider = self.embedder.name(),
            "embedding document chunks"
        );

        let mut rows = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.embedder.embed(&chunk).await?;
            rows.push(NewChunk {
                content: chunk,
                embedding,
                attributes: request.attributes.clone(),
            });
        }

        let chunk_count = self
            .store
            .replace_document(&request.collection, &document_id, rows)
            .await?;

        tracing::info!(
            document_id = %document_id,
            collection = %request.collection,
            chunk_count,
            "document ingested"
        );

        Ok(IngestReceipt {
            status: "ok".to_string(),
            chunk_count,
        })
    }

    /// Rank stored chunks against a caller-supplied query vector, applying
    /// the full attribute filter conjunction. The response echoes the
    /// conditions the ranking ran under.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, StashError> {
        let filter = request.attributes_filter.clone().unwrap_or_default();
        let conditions = QueryConditions {
            collection: request.collection.clone(),
            attributes_filter: request.attributes_filter,
            top_k: Some(request.top_k),
        };

        if request.top_k <= 0 {
            return Ok(SearchResponse {
                matches: Vec::new(),
                conditions,
            });
        }

        let matches = self
            .store
            .search(
                &request.collection,
                &request.query_embedding,
                request.top_k as usize,
                &filter,
            )
            .await?;

        tracing::debug!(
            collection = %conditions.collection,
            matched = matches.len(),
            "search completed"
        );

        Ok(SearchResponse { matches, conditions })
    }

    /// Predicate deletion with a dry-run mode.
    ///
    /// `dry_run` returns the full matched row set without mutating
    /// storage; a live run deletes and returns the count. An absent or
    /// empty filter matches the whole collection, a deliberate wipe.
    pub async fn delete(&self, request: DeleteRequest) -> Result<DeleteOutcome, StashError> {
        let filter = request.attributes_filter.clone().unwrap_or_default();
        let conditions = QueryConditions {
            collection: request.collection.clone(),
            attributes_filter: request.attributes_filter,
            top_k: None,
        };

        if request.dry_run {
            let rows = self
                .store
                .preview_by_filter(&request.collection, &filter)
                .await?;
            tracing::debug!(
                collection = %conditions.collection,
                matched = rows.len(),
                "delete dry run"
            );
            return Ok(DeleteOutcome::Preview {
                matched_count: rows.len(),
                rows,
                conditions,
            });
        }

        let deleted_count = self
            .store
            .delete_by_filter(&request.collection, &filter)
            .await?;
        tracing::info!(
            collection = %conditions.collection,
            deleted_count,
            "chunks deleted"
        );

        Ok(DeleteOutcome::Deleted {
            status: "ok".to_string(),
            deleted_count,
            conditions,
        })
    }

    /// Embed a single text through the configured provider, without
    /// touching storage.
    pub async fn embed(&self, text: &str) -> Result<EmbedResponse, StashError> {
        if text.trim().is_empty() {
            return Err(StashError::Validation(
                "text must not be empty".to_string(),
            ));
        }
        let embedding = self.embedder.embed(text).await?;
        let dimension = embedding.len();
        Ok(EmbedResponse {
            embedding,
            dimension,
        })
    }
}

/// Ingestion requires a non-empty string `document_id` attribute: it is
/// the replacement key, and every stored chunk row carries it.
fn require_document_id(attributes: &AttributeMap) -> Result<String, StashError> {
    match attributes.get(DOCUMENT_ID_KEY) {
        Some(serde_json::Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        Some(_) => Err(StashError::Validation(format!(
            "attribute '{DOCUMENT_ID_KEY}' must be a non-empty string"
        ))),
        None => Err(StashError::Validation(format!(
            "attribute '{DOCUMENT_ID_KEY}' is required for ingestion"
        ))),
    }
}
