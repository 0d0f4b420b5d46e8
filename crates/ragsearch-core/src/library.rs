//! Library container: one chunk store + one index under a reader-writer lock.
//!
//! The library is the unit of indexing and the unit of concurrency. All
//! state sits behind a single `tokio::sync::RwLock` (write-preferring and
//! FIFO-fair): `search` takes a read guard, every mutation takes the write
//! guard, so readers always observe the chunk set committed by the last
//! writer to release the lock.
//!
//! Mutations are all-or-nothing. Multi-chunk writes keep an undo log and
//! roll back the partial work of the failing call before surfacing the
//! error; document replacement removes old chunks and installs new ones
//! inside one write critical section so no reader sees a mixed document.

use std::collections::BTreeMap;
use std::time::Instant;

use ragsearch_index::{kernel, IndexKind, IndexParams, VectorIndex};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use crate::chunk_store::ChunkStore;
use crate::error::{Error, Result};
use crate::types::{
    Chunk, ChunkId, DocumentId, DocumentRef, LibraryId, LibraryInfo, Metadata, SearchHit,
    SearchOutcome,
};

/// Everything guarded by the library lock.
struct LibraryState {
    chunks: ChunkStore,
    index: Box<dyn VectorIndex>,
    /// Established by the first chunk; fixed for the library's lifetime.
    dimension: Option<usize>,
    documents: BTreeMap<DocumentId, DocumentRef>,
    metadata: Metadata,
}

/// A named container of documents, their chunks, and one vector index.
pub struct Library {
    id: LibraryId,
    name: String,
    index_type: IndexKind,
    params: IndexParams,
    state: RwLock<LibraryState>,
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("index_type", &self.index_type)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Library {
    /// Create an empty library backed by an index of the given kind.
    ///
    /// Fails with [`Error::InvalidParameter`] when `params` are malformed
    /// for the kind.
    pub fn new(
        name: impl Into<String>,
        index_type: IndexKind,
        params: IndexParams,
        metadata: Metadata,
    ) -> Result<Self> {
        let index = index_type.create(&params)?;
        Ok(Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            index_type,
            params,
            state: RwLock::new(LibraryState {
                chunks: ChunkStore::new(),
                index,
                dimension: None,
                documents: BTreeMap::new(),
                metadata,
            }),
        })
    }

    /// Library id.
    pub fn id(&self) -> LibraryId {
        self.id
    }

    /// Library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which index implementation backs this library.
    pub fn index_type(&self) -> IndexKind {
        self.index_type
    }

    /// Index parameters the library was created with.
    pub fn params(&self) -> &IndexParams {
        &self.params
    }

    /// Insert chunks into the library. All-or-nothing.
    ///
    /// Embeddings are normalized at install; the first chunk establishes
    /// the library's dimension and later chunks must match it.
    pub async fn add_chunks(
        &self,
        chunks: Vec<Chunk>,
        cancel: Option<&CancellationToken>,
    ) -> Result<usize> {
        ensure_not_cancelled(cancel)?;
        let mut state = self.state.write().await;
        let added = Self::add_chunks_locked(&mut state, chunks)?;
        if added > 0 {
            state.metadata.touch();
        }
        Ok(added)
    }

    /// Insert chunks under an already-held write guard, rolling back this
    /// call's partial work on failure.
    fn add_chunks_locked(state: &mut LibraryState, chunks: Vec<Chunk>) -> Result<usize> {
        let prior_dimension = state.dimension;
        let mut installed: Vec<ChunkId> = Vec::with_capacity(chunks.len());

        for mut chunk in chunks {
            let outcome = (|| -> Result<()> {
                let embedding = kernel::normalize(&chunk.embedding)?;
                if let Some(expected) = state.dimension {
                    if expected != embedding.len() {
                        return Err(Error::DimensionMismatch {
                            expected,
                            actual: embedding.len(),
                        });
                    }
                }
                if state.chunks.contains(&chunk.id) {
                    return Err(Error::AlreadyExists(chunk.id.to_string()));
                }
                state.index.add(chunk.id, embedding.clone())?;
                state.dimension.get_or_insert(embedding.len());
                chunk.embedding = embedding;
                installed.push(chunk.id);
                state.chunks.insert(chunk);
                Ok(())
            })();

            if let Err(e) = outcome {
                for id in &installed {
                    state.index.remove(id);
                    state.chunks.remove(id);
                }
                state.dimension = prior_dimension;
                return Err(e);
            }
        }

        Ok(installed.len())
    }

    /// Remove chunks by id. Absent ids are tolerated no-ops; returns how
    /// many chunks were actually removed.
    pub async fn remove_chunks(
        &self,
        ids: &[ChunkId],
        cancel: Option<&CancellationToken>,
    ) -> Result<usize> {
        ensure_not_cancelled(cancel)?;
        let mut state = self.state.write().await;
        let removed = Self::remove_chunks_locked(&mut state, ids)?;
        if removed > 0 {
            state.metadata.touch();
        }
        Ok(removed)
    }

    fn remove_chunks_locked(state: &mut LibraryState, ids: &[ChunkId]) -> Result<usize> {
        let mut removed: Vec<Chunk> = Vec::new();

        for id in ids {
            let was_indexed = state.index.remove(id);
            let record = state.chunks.remove(id);
            match (was_indexed, record) {
                (true, Some(chunk)) => removed.push(chunk),
                (false, None) => {}
                (was_indexed, record) => {
                    // Index and store disagree; undo and surface.
                    if let Some(chunk) = record {
                        state.chunks.insert(chunk);
                    }
                    for chunk in removed {
                        let _ = state.index.add(chunk.id, chunk.embedding.clone());
                        state.chunks.insert(chunk);
                    }
                    return Err(Error::InternalInconsistency(format!(
                        "chunk {id} present in {} only",
                        if was_indexed { "index" } else { "store" }
                    )));
                }
            }
        }

        Ok(removed.len())
    }

    /// Remove a document and all of its chunks.
    pub async fn remove_document(
        &self,
        document_id: &DocumentId,
        cancel: Option<&CancellationToken>,
    ) -> Result<usize> {
        ensure_not_cancelled(cancel)?;
        let mut state = self.state.write().await;

        let ids = state.chunks.ids_for_document(document_id);
        let known = state.documents.remove(document_id);
        if known.is_none() && ids.is_empty() {
            return Err(Error::NotFound(format!("document {document_id}")));
        }

        match Self::remove_chunks_locked(&mut state, &ids) {
            Ok(removed) => {
                state.metadata.touch();
                debug!(library = %self.id, document = %document_id, removed, "removed document");
                Ok(removed)
            }
            Err(e) => {
                if let Some(doc) = known {
                    state.documents.insert(doc.id, doc);
                }
                Err(e)
            }
        }
    }

    /// Atomically replace a document's chunk set.
    ///
    /// Old chunks (if any) are removed and the new set installed inside a
    /// single write critical section, so concurrent readers observe either
    /// the full old set or the full new set, never a mixture. On failure
    /// the old chunks are restored and the error surfaced.
    pub async fn replace_document(
        &self,
        document: DocumentRef,
        chunks: Vec<Chunk>,
        cancel: Option<&CancellationToken>,
    ) -> Result<usize> {
        ensure_not_cancelled(cancel)?;
        let mut state = self.state.write().await;

        let old_ids = state.chunks.ids_for_document(&document.id);
        let mut old_chunks: Vec<Chunk> = Vec::with_capacity(old_ids.len());
        for id in &old_ids {
            state.index.remove(id);
            if let Some(chunk) = state.chunks.remove(id) {
                old_chunks.push(chunk);
            }
        }

        match Self::add_chunks_locked(&mut state, chunks) {
            Ok(added) => {
                state.documents.insert(document.id, document);
                state.metadata.touch();
                debug!(
                    library = %self.id,
                    removed = old_chunks.len(),
                    added,
                    "replaced document chunk set"
                );
                Ok(added)
            }
            Err(e) => {
                for chunk in old_chunks {
                    let _ = state.index.add(chunk.id, chunk.embedding.clone());
                    state.chunks.insert(chunk);
                }
                Err(e)
            }
        }
    }

    /// k-nearest-neighbor search over the library.
    ///
    /// The query is normalized before the index is consulted; hits are
    /// hydrated from the chunk store. An id the index returns but the
    /// store lacks is dropped and logged as an internal inconsistency.
    #[instrument(skip(self, query_vector), fields(library = %self.id, k, min_sim))]
    pub async fn search(
        &self,
        query_vector: &[f32],
        k: usize,
        min_sim: f32,
    ) -> Result<SearchOutcome> {
        if k < 1 {
            return Err(Error::InvalidParameter("k must be at least 1".into()));
        }
        if !(-1.0..=1.0).contains(&min_sim) {
            return Err(Error::InvalidParameter(
                "min_similarity must be within [-1, 1]".into(),
            ));
        }
        let query = kernel::normalize(query_vector)?;

        let started = Instant::now();
        let state = self.state.read().await;
        let pairs = state.index.query(&query, k, min_sim)?;

        let mut results = Vec::with_capacity(pairs.len());
        for (id, similarity) in pairs {
            match state.chunks.get(&id) {
                Some(chunk) => results.push(SearchHit {
                    chunk: chunk.clone(),
                    similarity,
                }),
                None => {
                    error!(
                        library = %self.id,
                        chunk = %id,
                        "index returned id absent from chunk store; dropping"
                    );
                }
            }
        }

        Ok(SearchOutcome {
            results,
            total_chunks_searched: state.chunks.len(),
            query_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Update the library's mutable metadata fields.
    pub async fn update_metadata(
        &self,
        username: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Metadata {
        let mut state = self.state.write().await;
        if let Some(username) = username {
            state.metadata.username = Some(username);
        }
        if let Some(tags) = tags {
            state.metadata.tags = tags;
        }
        state.metadata.touch();
        state.metadata.clone()
    }

    /// Whether the library knows this document (a registered ref or at
    /// least one chunk).
    pub async fn has_document(&self, document_id: &DocumentId) -> bool {
        let state = self.state.read().await;
        state.documents.contains_key(document_id)
            || state.chunks.iter().any(|c| c.document_id == *document_id)
    }

    /// Point-in-time snapshot for listings and API responses.
    pub async fn snapshot_info(&self) -> LibraryInfo {
        let state = self.state.read().await;
        let mut doc_ids: std::collections::BTreeSet<DocumentId> =
            state.documents.keys().copied().collect();
        doc_ids.extend(state.chunks.iter().map(|c| c.document_id));
        LibraryInfo {
            id: self.id,
            name: self.name.clone(),
            index_type: self.index_type,
            chunk_count: state.chunks.len(),
            document_count: doc_ids.len(),
            dimension: state.dimension,
            metadata: state.metadata.clone(),
        }
    }

    /// Check that the chunk store and the index agree on the id set.
    pub async fn verify_coherence(&self) -> Result<()> {
        let state = self.state.read().await;
        let store_ids = state.chunks.ids();
        let index_ids = state.index.ids();
        if store_ids != index_ids {
            return Err(Error::InternalInconsistency(format!(
                "store holds {} ids, index holds {}",
                store_ids.len(),
                index_ids.len()
            )));
        }
        Ok(())
    }
}

fn ensure_not_cancelled(cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}
