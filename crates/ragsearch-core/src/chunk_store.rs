//! Per-library chunk record store.
//!
//! An ordered map from chunk id to chunk record. Pure storage: the store
//! never touches the index, and coherence between the two is the library
//! container's job.

use std::collections::BTreeMap;

use crate::types::{Chunk, ChunkId, DocumentId};

/// Ordered map of chunk records.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: BTreeMap<ChunkId, Chunk>,
}

impl ChunkStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previous record for that id if any.
    pub fn insert(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(chunk.id, chunk)
    }

    /// Look up a record.
    pub fn get(&self, id: &ChunkId) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Remove a record, returning it if present.
    pub fn remove(&mut self, id: &ChunkId) -> Option<Chunk> {
        self.chunks.remove(id)
    }

    /// Whether the id is present.
    pub fn contains(&self, id: &ChunkId) -> bool {
        self.chunks.contains_key(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunk ids, ascending.
    pub fn ids(&self) -> Vec<ChunkId> {
        self.chunks.keys().copied().collect()
    }

    /// Ids of the chunks belonging to a document, ascending.
    pub fn ids_for_document(&self, document_id: &DocumentId) -> Vec<ChunkId> {
        self.chunks
            .values()
            .filter(|c| c.document_id == *document_id)
            .map(|c| c.id)
            .collect()
    }

    /// Iterate records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }
}
