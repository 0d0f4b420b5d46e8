//! API documentation — Swagger UI at `/docs`.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::documents::{DocumentRequest, DocumentResponse};
use super::error::ErrorBody;
use super::health::{EndpointMap, HealthResponse, RootResponse};
use super::libraries::{CreateLibraryRequest, LibraryView, UpdateLibraryRequest};
use super::search::{ChunkView, MetadataView, SearchRequest, SearchResponse, SearchResultView};
use crate::server::AppState;

/// RAGSearch Engine OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RAGSearch Engine",
        version = "0.1.0",
        description = "Semantic search for RAG applications: libraries of \
documents, chunked and embedded, searched by cosine similarity over \
pluggable vector indexes (naive, lsh, vptree)."
    ),
    servers((url = "/", description = "Local server")),
    paths(
        crate::api::health::root,
        crate::api::health::health,
        crate::api::libraries::create_library,
        crate::api::libraries::list_libraries,
        crate::api::libraries::get_library,
        crate::api::libraries::update_library,
        crate::api::libraries::delete_library,
        crate::api::documents::create_document,
        crate::api::documents::update_document,
        crate::api::documents::delete_document,
        crate::api::search::search_library,
    ),
    components(schemas(
        RootResponse,
        HealthResponse,
        EndpointMap,
        ErrorBody,
        CreateLibraryRequest,
        UpdateLibraryRequest,
        LibraryView,
        DocumentRequest,
        DocumentResponse,
        SearchRequest,
        SearchResponse,
        SearchResultView,
        ChunkView,
        MetadataView,
    )),
    tags(
        (name = "health", description = "Liveness and health checks"),
        (name = "libraries", description = "Library CRUD"),
        (name = "documents", description = "Document ingest and lifecycle"),
        (name = "search", description = "Semantic search"),
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI routes.
pub fn docs_routes() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
