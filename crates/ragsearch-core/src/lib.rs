//! ragsearch core: libraries, chunks, and the coherence between them.
//!
//! # Architecture
//!
//! ```text
//! Registry ──owns──► Library ──owns──► ChunkStore (records)
//!                       │       └────► VectorIndex (ids + vectors)
//!                       │
//!                RwLock (per library)
//!                       ▲
//! DocumentProcessor ────┘  (split → embed → atomic install)
//! ```
//!
//! The library is the unit of concurrency: one reader-writer lock guards
//! both the chunk store and the index, so they never drift apart under
//! interleaved readers and writers. Ownership is strictly downward —
//! registry owns libraries, a library owns its store and index, the index
//! borrows chunk ids only — and documents reference their library by id,
//! never by pointer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chunk_store;
pub mod error;
pub mod library;
pub mod processor;
pub mod registry;
pub mod types;

pub use chunk_store::ChunkStore;
pub use error::{Error, Result};
pub use library::Library;
pub use processor::{DocumentProcessor, DEFAULT_CHUNK_SIZE};
pub use registry::Registry;
pub use types::{
    Chunk, ChunkId, DocumentId, DocumentRef, IngestReport, LibraryId, LibraryInfo, Metadata,
    SearchHit, SearchOutcome,
};
