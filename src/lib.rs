//! ```text
//! Raw text ──► chunking::chunk_text ──► sentence-aligned chunks
//!                                            │
//!                     embeddings::EmbeddingProvider (one vector per chunk)
//!                                            │
//! pipeline::DocumentPipeline ──► stores::DocumentStore
//!           │                        ├─► replace-on-ingest (single transaction)
//!           │                        ├─► attribute-filtered similarity search
//!           └─► echoed conditions    └─► predicate delete with dry-run preview
//! ```
//!
//! Documents land in named collections as embedded chunk rows. Re-ingesting
//! a `document_id` atomically supersedes its previous chunk set; searches
//! rank stored vectors by L2 distance; deletions compile an attribute
//! filter into a conjunctive predicate and can be previewed before they run.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod pipeline;
pub mod stores;
pub mod types;

pub use chunking::chunk_text;
pub use embeddings::{EmbeddingProvider, HttpEmbeddingGateway, MockEmbeddingProvider};
pub use pipeline::DocumentPipeline;
pub use stores::{DocumentStore, SqliteDocumentStore};
pub use types::StashError;
