//! Document processor: split, embed, atomically install.
//!
//! Turns raw document text into an installed chunk set. The provider call
//! is the slow part and happens before the library write lock is taken, so
//! embedding latency never stalls readers of the target library.

use std::sync::Arc;

use ragsearch_embed::EmbeddingProvider;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::library::Library;
use crate::types::{Chunk, DocumentId, DocumentRef, IngestReport, Metadata};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Splits documents, requests embeddings in batch, and installs chunk sets.
pub struct DocumentProcessor {
    provider: Arc<dyn EmbeddingProvider>,
}

impl DocumentProcessor {
    /// Create a processor over an embedding provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// The provider backing this processor.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Split text into chunks of at most `chunk_size` characters.
    ///
    /// Prefers to break at the nearest whitespace within the last 20% of
    /// the window, hard-breaks otherwise. Whitespace-only text yields no
    /// chunks.
    pub fn split_text(text: &str, chunk_size: usize) -> Result<Vec<String>> {
        if chunk_size == 0 {
            return Err(Error::InvalidParameter(
                "chunk_size must be at least 1".into(),
            ));
        }

        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + chunk_size).min(chars.len());
            let mut next = end;
            let mut cut = end;
            if end < chars.len() {
                // Look for whitespace in the last 20% of the window.
                let floor = start + (chunk_size - chunk_size / 5).max(1);
                if let Some(ws) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                    cut = ws;
                    next = ws + 1;
                }
            }
            let piece: String = chars[start..cut].iter().collect();
            if !piece.trim().is_empty() {
                chunks.push(piece);
            }
            start = next;
        }

        Ok(chunks)
    }

    /// Split, embed, and atomically install a document into a library.
    ///
    /// Replaces any prior chunks of `document_id` (document update). A
    /// provider failure aborts the whole operation; nothing is installed.
    #[instrument(skip(self, library, text, metadata, cancel), fields(library = %library.id(), document = %document_id))]
    pub async fn ingest(
        &self,
        library: &Library,
        document_id: DocumentId,
        text: &str,
        chunk_size: usize,
        metadata: Metadata,
        cancel: Option<&CancellationToken>,
    ) -> Result<IngestReport> {
        let pieces = Self::split_text(text, chunk_size)?;

        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        // Network suspension happens here, before any library lock.
        let embeddings = self.provider.embed(&pieces).await?;
        if embeddings.len() != pieces.len() {
            return Err(Error::EmbeddingProvider(format!(
                "provider returned {} embeddings for {} texts",
                embeddings.len(),
                pieces.len()
            )));
        }

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .zip(embeddings)
            .map(|(piece, embedding)| {
                Chunk::new(document_id, piece, embedding, metadata.clone())
            })
            .collect();
        let chunk_count = chunks.len();

        let document = DocumentRef {
            id: document_id,
            library_id: library.id(),
            chunk_size,
            metadata,
        };
        library.replace_document(document, chunks, cancel).await?;

        debug!(chunk_count, "document installed");
        Ok(IngestReport {
            document_id,
            chunk_count,
        })
    }
}
