//! Process-wide library registry.
//!
//! Maps library ids to library containers. The registry's own mutex guards
//! only the map: operations clone an `Arc` handle out and release the lock
//! before any library-level work, so registry contention never serializes
//! searches or writes. Deleting a library removes the map entry; in-flight
//! holders of the handle drain on the library's own lock.
//!
//! The registry has process lifetime: it is constructed explicitly at
//! startup and owned by the server state, never modeled as ambient global
//! state.

use std::collections::HashMap;
use std::sync::Arc;

use ragsearch_index::{IndexKind, IndexParams};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::library::Library;
use crate::types::{LibraryId, Metadata};

/// Registry of all live libraries.
#[derive(Default)]
pub struct Registry {
    libraries: Mutex<HashMap<LibraryId, Arc<Library>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library and register it.
    pub async fn create(
        &self,
        name: impl Into<String>,
        index_type: IndexKind,
        params: IndexParams,
        metadata: Metadata,
    ) -> Result<Arc<Library>> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidParameter("library name must not be empty".into()));
        }

        let library = Arc::new(Library::new(name, index_type, params, metadata)?);
        let mut map = self.libraries.lock().await;
        map.insert(library.id(), Arc::clone(&library));
        info!(library = %library.id(), name = library.name(), index = %index_type, "created library");
        Ok(library)
    }

    /// Look up a library handle.
    pub async fn get(&self, id: &LibraryId) -> Result<Arc<Library>> {
        let map = self.libraries.lock().await;
        map.get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("library {id}")))
    }

    /// Handles to all registered libraries.
    pub async fn list(&self) -> Vec<Arc<Library>> {
        let map = self.libraries.lock().await;
        let mut libraries: Vec<Arc<Library>> = map.values().cloned().collect();
        libraries.sort_by_key(|l| l.id());
        libraries
    }

    /// Update a library's mutable metadata, returning the new metadata.
    pub async fn update_metadata(
        &self,
        id: &LibraryId,
        username: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Metadata> {
        let library = self.get(id).await?;
        Ok(library.update_metadata(username, tags).await)
    }

    /// Remove a library from the registry.
    ///
    /// Operations already holding the handle complete against the detached
    /// library; its memory is reclaimed when the last handle drops.
    pub async fn delete(&self, id: &LibraryId) -> Result<()> {
        let removed = {
            let mut map = self.libraries.lock().await;
            map.remove(id)
        };
        match removed {
            Some(library) => {
                debug!(library = %library.id(), "deleted library");
                Ok(())
            }
            None => Err(Error::NotFound(format!("library {id}"))),
        }
    }

    /// Number of registered libraries.
    pub async fn len(&self) -> usize {
        self.libraries.lock().await.len()
    }

    /// Whether no libraries are registered.
    pub async fn is_empty(&self) -> bool {
        self.libraries.lock().await.is_empty()
    }
}
