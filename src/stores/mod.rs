//! Storage backends for embedded chunk rows.
//!
//! ```text
//!                  ┌────────────────────┐
//!                  │ DocumentStore trait│
//!                  │    (async CRUD)    │
//!                  └─────────┬──────────┘
//!                            │
//!                            ▼
//!                  ┌────────────────────┐
//!                  │ SQLite + sqlite-vec│
//!                  │ one table per      │
//!                  │ collection         │
//!                  └────────────────────┘
//! ```
//!
//! Every operation is scoped by a caller-supplied collection name. Filters
//! are conjunctions of attribute-key equality tests, compiled into
//! parameterized predicates. Collection names and attribute keys pass
//! strict identifier validation before they reach any SQL text, so neither
//! can smuggle query fragments.

pub mod sqlite;

use async_trait::async_trait;

use crate::types::{AttributeMap, ChunkRow, NewChunk, SearchMatch, StashError};

pub use sqlite::SqliteDocumentStore;

/// Persistence contract for chunk rows, scoped per collection.
///
/// Each call is self-contained: no transaction spans two calls, and no
/// isolation is promised between a [`preview_by_filter`] and a subsequent
/// [`delete_by_filter`]: a concurrent writer can change the matched set
/// in between.
///
/// [`preview_by_filter`]: DocumentStore::preview_by_filter
/// [`delete_by_filter`]: DocumentStore::delete_by_filter
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one chunk row. Never deduplicates: inserting the same
    /// content twice creates two rows. Returns the assigned row id.
    async fn insert(&self, collection: &str, chunk: NewChunk) -> Result<String, StashError>;

    /// Delete every row whose `attributes.document_id` equals the given
    /// value. Returns the number of rows removed.
    async fn delete_by_document_id(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<usize, StashError>;

    /// Dry-run half of predicate deletion: the full matched row set,
    /// without mutating storage. An empty filter matches every row.
    async fn preview_by_filter(
        &self,
        collection: &str,
        filter: &AttributeMap,
    ) -> Result<Vec<ChunkRow>, StashError>;

    /// Execute a predicate deletion and return the count. An empty filter
    /// wipes the collection; callers opt into that explicitly.
    async fn delete_by_filter(
        &self,
        collection: &str,
        filter: &AttributeMap,
    ) -> Result<usize, StashError>;

    /// Rank stored vectors by L2 distance to `query_embedding`, applying
    /// the full conjunction of `filter`, and truncate to `top_k`. A
    /// missing or empty collection yields an empty result, not an error.
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
        filter: &AttributeMap,
    ) -> Result<Vec<SearchMatch>, StashError>;

    /// Atomically supersede a document: delete every row carrying
    /// `document_id`, then insert `rows`, all in one transaction. Either
    /// the new chunk set is fully visible or the old one survives intact.
    /// Returns the number of rows written.
    async fn replace_document(
        &self,
        collection: &str,
        document_id: &str,
        rows: Vec<NewChunk>,
    ) -> Result<usize, StashError>;

    /// Total rows in the collection; 0 when the collection does not exist.
    async fn count(&self, collection: &str) -> Result<usize, StashError>;
}

/// Reject anything that is not a strict `[A-Za-z_][A-Za-z0-9_]*`
/// identifier. Applied to collection names and attribute filter keys
/// before they are ever spliced into or bound against a query.
pub(crate) fn validate_identifier(kind: &str, name: &str) -> Result<(), StashError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StashError::Validation(format!(
            "{kind} '{name}' is not a valid identifier"
        )))
    }
}
