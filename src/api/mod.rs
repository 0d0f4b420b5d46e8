//! Web API for the RAGSearch Engine.
//!
//! JSON over HTTP, mapping 1:1 onto the core operations:
//! - Library CRUD
//! - Document ingest / replace / delete
//! - Semantic search within a library

pub mod docs;
pub mod documents;
pub mod error;
pub mod health;
pub mod libraries;
pub mod search;

use axum::Router;

use crate::server::AppState;

pub use docs::docs_routes;
pub use documents::documents_routes;
pub use health::health_routes;
pub use libraries::libraries_routes;
pub use search::search_routes;

/// Assemble all API routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(libraries_routes())
        .merge(documents_routes())
        .merge(search_routes())
        .merge(docs_routes())
}
