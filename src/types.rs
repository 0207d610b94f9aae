//! Error taxonomy, chunk records, and the wire-level request/response types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Open string-keyed attribute bag attached to every stored chunk.
pub type AttributeMap = serde_json::Map<String, serde_json::Value>;

/// Reserved attribute key identifying the logical document a chunk belongs to.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// Errors surfaced by the ingestion/query pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum StashError {
    /// Client-side failure: a missing required field or empty input.
    /// Requests failing validation are rejected before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The embedding gateway was unreachable, answered with a non-success
    /// status, or produced no usable vector.
    #[error("embedding gateway failed: {0}")]
    Embedding(String),

    /// Connectivity or query failure against the backing store.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// A stored chunk row as returned by dry-run previews.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRow {
    pub id: String,
    pub content: String,
    pub attributes: serde_json::Value,
}

/// A ranked similarity-search hit. `distance` is a monotonic dissimilarity
/// (L2); results are ordered by non-decreasing distance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchMatch {
    pub id: String,
    pub content: String,
    pub attributes: serde_json::Value,
    pub distance: f64,
}

/// A chunk staged for insertion: content, its vector, and the attribute bag.
#[derive(Clone, Debug)]
pub struct NewChunk {
    pub content: String,
    pub embedding: Vec<f32>,
    pub attributes: AttributeMap,
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> i64 {
    500
}

fn default_overlap() -> i64 {
    100
}

fn default_top_k() -> i64 {
    5
}

fn default_collection() -> String {
    "documents".to_string()
}

/// Ingest-or-replace request. `attributes` must carry [`DOCUMENT_ID_KEY`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestRequest {
    pub document_text: String,
    #[serde(default = "default_true")]
    pub chunk: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,
    #[serde(default = "default_overlap")]
    pub overlap: i64,
    pub attributes: AttributeMap,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl IngestRequest {
    /// Build a request with the documented defaults (chunking on,
    /// `chunk_size` 500, `overlap` 100, collection `"documents"`).
    pub fn new(document_text: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            document_text: document_text.into(),
            chunk: default_true(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            attributes,
            collection: default_collection(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub fn with_chunking(mut self, chunk_size: i64, overlap: i64) -> Self {
        self.chunk = true;
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    /// Store the whole text as a single row instead of chunking it.
    #[must_use]
    pub fn without_chunking(mut self) -> Self {
        self.chunk = false;
        self
    }
}

/// Acknowledgement for a completed ingest: the number of chunk rows written.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub status: String,
    pub chunk_count: usize,
}

/// Similarity-search request over a precomputed query vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query_embedding: Vec<f32>,
    #[serde(default)]
    pub attributes_filter: Option<AttributeMap>,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl SearchRequest {
    pub fn new(query_embedding: Vec<f32>) -> Self {
        Self {
            query_embedding,
            attributes_filter: None,
            top_k: default_top_k(),
            collection: default_collection(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: AttributeMap) -> Self {
        self.attributes_filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }
}

/// The query conditions actually applied, echoed back for auditability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryConditions {
    pub collection: String,
    pub attributes_filter: Option<AttributeMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
}

/// Ranked matches plus the conditions that produced them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub matches: Vec<SearchMatch>,
    pub conditions: QueryConditions,
}

/// Predicate-deletion request. An empty (or absent) filter matches every
/// row in the collection; full-wipe semantics are explicit, not an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub attributes_filter: Option<AttributeMap>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub dry_run: bool,
}

impl DeleteRequest {
    pub fn new(attributes_filter: Option<AttributeMap>) -> Self {
        Self {
            attributes_filter,
            collection: default_collection(),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Outcome of a predicate deletion: a preview of the matched rows when
/// `dry_run` was set, otherwise the executed deletion count.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DeleteOutcome {
    Preview {
        matched_count: usize,
        rows: Vec<ChunkRow>,
        conditions: QueryConditions,
    },
    Deleted {
        status: String,
        deleted_count: usize,
        conditions: QueryConditions,
    },
}

/// Pass-through embedding reply: the vector and its dimension.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
    pub dimension: usize,
}
