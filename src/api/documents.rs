//! Document endpoints: ingest, update, delete.
//!
//! POST   /api/v1/libraries/{id}/documents            - Ingest a document
//! PUT    /api/v1/libraries/{id}/documents/{doc_id}   - Replace a document's text
//! DELETE /api/v1/libraries/{id}/documents/{doc_id}   - Delete a document
//!
//! Ingest splits the text, embeds every chunk in one provider batch, and
//! installs the chunk set atomically; an update never leaves a mixed
//! old/new chunk set visible to readers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use ragsearch_core::{Error as CoreError, Metadata, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use crate::server::AppState;

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Request body for ingesting or replacing a document.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DocumentRequest {
    /// Full document text
    pub text: String,
    /// Character bound per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Creator
    #[serde(default)]
    pub username: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Response for a successful document install.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    /// The document id
    pub document_id: Uuid,
    /// How many chunks the document produced
    pub chunk_count: usize,
}

/// Ingest a new document
#[utoipa::path(
    post,
    path = "/api/v1/libraries/{library_id}/documents",
    tag = "documents",
    params(("library_id" = Uuid, Path, description = "Library id")),
    request_body = DocumentRequest,
    responses(
        (status = 201, description = "Document ingested", body = DocumentResponse),
        (status = 404, description = "Library not found"),
        (status = 502, description = "Embedding provider failure")
    )
)]
pub async fn create_document(
    State(state): State<AppState>,
    Path(library_id): Path<Uuid>,
    Json(req): Json<DocumentRequest>,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    let library = state.registry.get(&library_id).await?;
    let report = state
        .processor
        .ingest(
            &library,
            Uuid::new_v4(),
            &req.text,
            req.chunk_size,
            Metadata::new(req.username, req.tags),
            None,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse {
            document_id: report.document_id,
            chunk_count: report.chunk_count,
        }),
    ))
}

/// Replace an existing document's text
#[utoipa::path(
    put,
    path = "/api/v1/libraries/{library_id}/documents/{document_id}",
    tag = "documents",
    params(
        ("library_id" = Uuid, Path, description = "Library id"),
        ("document_id" = Uuid, Path, description = "Document id")
    ),
    request_body = DocumentRequest,
    responses(
        (status = 200, description = "Document replaced", body = DocumentResponse),
        (status = 404, description = "Library or document not found"),
        (status = 502, description = "Embedding provider failure")
    )
)]
pub async fn update_document(
    State(state): State<AppState>,
    Path((library_id, document_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<DocumentRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    let library = state.registry.get(&library_id).await?;
    if !library.has_document(&document_id).await {
        return Err(ApiError(CoreError::NotFound(format!(
            "document {document_id}"
        ))));
    }
    let report = state
        .processor
        .ingest(
            &library,
            document_id,
            &req.text,
            req.chunk_size,
            Metadata::new(req.username, req.tags),
            None,
        )
        .await?;
    Ok(Json(DocumentResponse {
        document_id,
        chunk_count: report.chunk_count,
    }))
}

/// Delete a document and its chunks
#[utoipa::path(
    delete,
    path = "/api/v1/libraries/{library_id}/documents/{document_id}",
    tag = "documents",
    params(
        ("library_id" = Uuid, Path, description = "Library id"),
        ("document_id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Library or document not found")
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path((library_id, document_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let library = state.registry.get(&library_id).await?;
    library.remove_document(&document_id, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create document routes.
pub fn documents_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/libraries/{library_id}/documents",
            post(create_document),
        )
        .route(
            "/api/v1/libraries/{library_id}/documents/{document_id}",
            put(update_document).delete(delete_document),
        )
}
