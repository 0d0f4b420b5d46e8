//! Library CRUD endpoints.
//!
//! POST   /api/v1/libraries               - Create a library
//! GET    /api/v1/libraries               - List libraries
//! GET    /api/v1/libraries/{id}          - Get one library
//! PUT    /api/v1/libraries/{id}          - Update library metadata
//! DELETE /api/v1/libraries/{id}          - Delete a library and its chunks

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use ragsearch_core::{LibraryInfo, Metadata};
use ragsearch_index::{IndexKind, IndexParams};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Request body for creating a library.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLibraryRequest {
    /// Library name
    pub name: String,
    /// Index implementation: `naive`, `lsh`, or `vptree`
    pub index_type: String,
    /// Optional index tuning parameters
    #[serde(default)]
    #[schema(value_type = Object)]
    pub index_params: Option<IndexParams>,
    /// Creator
    #[serde(default)]
    pub username: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for updating library metadata.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLibraryRequest {
    /// New username, if changing
    #[serde(default)]
    pub username: Option<String>,
    /// New tag set, if changing
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Library representation returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct LibraryView {
    /// Library id
    pub id: Uuid,
    /// Library name
    pub name: String,
    /// Backing index implementation
    pub index_type: String,
    /// Number of chunks currently indexed
    pub chunk_count: usize,
    /// Number of documents in the library
    pub document_count: usize,
    /// Embedding dimension, once established
    pub dimension: Option<usize>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last successful mutation
    pub updated_at: DateTime<Utc>,
    /// Creator
    pub username: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
}

impl From<LibraryInfo> for LibraryView {
    fn from(info: LibraryInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            index_type: info.index_type.to_string(),
            chunk_count: info.chunk_count,
            document_count: info.document_count,
            dimension: info.dimension,
            created_at: info.metadata.created_at,
            updated_at: info.metadata.updated_at,
            username: info.metadata.username,
            tags: info.metadata.tags,
        }
    }
}

/// Create a library
#[utoipa::path(
    post,
    path = "/api/v1/libraries",
    tag = "libraries",
    request_body = CreateLibraryRequest,
    responses(
        (status = 201, description = "Library created", body = LibraryView),
        (status = 400, description = "Unknown index type or malformed parameters")
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    Json(req): Json<CreateLibraryRequest>,
) -> ApiResult<(StatusCode, Json<LibraryView>)> {
    let index_type: IndexKind = req
        .index_type
        .parse()
        .map_err(|e: ragsearch_index::Error| ApiError(e.into()))?;
    let params = req.index_params.unwrap_or_default();
    let metadata = Metadata::new(req.username, req.tags);

    let library = state
        .registry
        .create(req.name, index_type, params, metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(library.snapshot_info().await.into())))
}

/// List all libraries
#[utoipa::path(
    get,
    path = "/api/v1/libraries",
    tag = "libraries",
    responses((status = 200, description = "All libraries", body = Vec<LibraryView>))
)]
pub async fn list_libraries(State(state): State<AppState>) -> Json<Vec<LibraryView>> {
    let mut views = Vec::new();
    for library in state.registry.list().await {
        views.push(library.snapshot_info().await.into());
    }
    Json(views)
}

/// Get one library
#[utoipa::path(
    get,
    path = "/api/v1/libraries/{library_id}",
    tag = "libraries",
    params(("library_id" = Uuid, Path, description = "Library id")),
    responses(
        (status = 200, description = "The library", body = LibraryView),
        (status = 404, description = "Library not found")
    )
)]
pub async fn get_library(
    State(state): State<AppState>,
    Path(library_id): Path<Uuid>,
) -> ApiResult<Json<LibraryView>> {
    let library = state.registry.get(&library_id).await?;
    Ok(Json(library.snapshot_info().await.into()))
}

/// Update library metadata
#[utoipa::path(
    put,
    path = "/api/v1/libraries/{library_id}",
    tag = "libraries",
    params(("library_id" = Uuid, Path, description = "Library id")),
    request_body = UpdateLibraryRequest,
    responses(
        (status = 200, description = "Updated library", body = LibraryView),
        (status = 404, description = "Library not found")
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    Path(library_id): Path<Uuid>,
    Json(req): Json<UpdateLibraryRequest>,
) -> ApiResult<Json<LibraryView>> {
    state
        .registry
        .update_metadata(&library_id, req.username, req.tags)
        .await?;
    let library = state.registry.get(&library_id).await?;
    Ok(Json(library.snapshot_info().await.into()))
}

/// Delete a library
#[utoipa::path(
    delete,
    path = "/api/v1/libraries/{library_id}",
    tag = "libraries",
    params(("library_id" = Uuid, Path, description = "Library id")),
    responses(
        (status = 204, description = "Library deleted"),
        (status = 404, description = "Library not found")
    )
)]
pub async fn delete_library(
    State(state): State<AppState>,
    Path(library_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.registry.delete(&library_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create library routes.
pub fn libraries_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/libraries", post(create_library).get(list_libraries))
        .route(
            "/api/v1/libraries/{library_id}",
            get(get_library).put(update_library).delete(delete_library),
        )
}
