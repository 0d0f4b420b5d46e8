//! Core data types: chunks, documents, metadata, search results.

use chrono::{DateTime, Utc};
use ragsearch_index::IndexKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Library identifier (UUID, process-unique).
pub type LibraryId = Uuid;
/// Document identifier (UUID, globally unique).
pub type DocumentId = Uuid;
/// Chunk identifier (UUID, globally unique).
pub type ChunkId = Uuid;

/// Creation / mutation metadata shared by libraries, documents, and chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Set at construction, never mutated
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful mutation
    pub updated_at: DateTime<Utc>,
    /// Who created the record
    pub username: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
}

impl Metadata {
    /// Create metadata stamped with the current time.
    pub fn new(username: Option<String>, tags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            username,
            tags,
        }
    }

    /// Refresh `updated_at` after a successful mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

/// A text fragment with its embedding: the unit of indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk id
    pub id: ChunkId,
    /// Owning document
    pub document_id: DocumentId,
    /// Chunk text
    pub text: String,
    /// Unit-normalized embedding (normalized at install)
    pub embedding: Vec<f32>,
    /// Chunk metadata
    pub metadata: Metadata,
}

impl Chunk {
    /// Create a chunk with a fresh id.
    pub fn new(
        document_id: DocumentId,
        text: impl Into<String>,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            text: text.into(),
            embedding,
            metadata,
        }
    }
}

/// A document installed into a library. Text lives in the document's
/// chunks; the record tracks identity and chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document id
    pub id: DocumentId,
    /// Owning library (by id, never by pointer)
    pub library_id: LibraryId,
    /// Character bound used to split this document
    pub chunk_size: usize,
    /// Document metadata
    pub metadata: Metadata,
}

/// Point-in-time snapshot of a library, for listings and API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryInfo {
    /// Library id
    pub id: LibraryId,
    /// Human-readable name
    pub name: String,
    /// Which index implementation backs the library
    pub index_type: IndexKind,
    /// Number of chunks currently indexed
    pub chunk_count: usize,
    /// Number of documents with chunks in the library
    pub document_count: usize,
    /// Embedding dimension, once established by the first chunk
    pub dimension: Option<usize>,
    /// Library metadata
    pub metadata: Metadata,
}

/// One search result: a chunk and its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// The matching chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query, in [-1, 1]
    pub similarity: f32,
}

/// Full result of a library search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Hits ordered by similarity descending, ascending id on ties
    pub results: Vec<SearchHit>,
    /// Library size at query time
    pub total_chunks_searched: usize,
    /// Wall-clock query duration in milliseconds
    pub query_time_ms: f64,
}

/// Result of installing a document through the processor.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// The installed document
    pub document_id: DocumentId,
    /// How many chunks the document produced
    pub chunk_count: usize,
}
