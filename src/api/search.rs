//! Semantic search endpoint.
//!
//! POST /api/v1/libraries/{id}/search
//!
//! The handler embeds the query text through the configured provider, then
//! runs the k-nearest-neighbor query against the library's index. Chunk
//! embeddings never leave the service; responses carry text and metadata
//! only.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use ragsearch_core::{Error as CoreError, SearchOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use crate::server::AppState;

fn default_k() -> usize {
    5
}

/// Search request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Query text; embedded with the same provider as the documents
    pub query_text: String,
    /// Maximum number of results (>= 1)
    #[serde(default = "default_k")]
    pub k: usize,
    /// Minimum similarity threshold in [-1, 1]
    #[serde(default)]
    pub min_similarity: f32,
}

/// Chunk fields exposed in search results.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChunkView {
    /// Chunk id
    pub id: Uuid,
    /// Owning document
    pub document_id: Uuid,
    /// Chunk text
    pub text: String,
    /// Chunk metadata
    pub metadata: MetadataView,
}

/// Metadata fields exposed on a chunk.
#[derive(Debug, Serialize, ToSchema)]
pub struct MetadataView {
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last successful mutation
    pub updated_at: DateTime<Utc>,
    /// Creator
    pub username: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
}

impl From<ragsearch_core::Metadata> for MetadataView {
    fn from(meta: ragsearch_core::Metadata) -> Self {
        Self {
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            username: meta.username,
            tags: meta.tags,
        }
    }
}

/// One search result.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResultView {
    /// The matching chunk
    pub chunk: ChunkView,
    /// Cosine similarity to the query
    pub similarity_score: f32,
}

/// Search response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// Results ordered by similarity descending
    pub results: Vec<SearchResultView>,
    /// Library size at query time
    pub total_chunks_searched: usize,
    /// Wall-clock query duration in milliseconds
    pub query_time_ms: f64,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            results: outcome
                .results
                .into_iter()
                .map(|hit| SearchResultView {
                    chunk: ChunkView {
                        id: hit.chunk.id,
                        document_id: hit.chunk.document_id,
                        text: hit.chunk.text,
                        metadata: hit.chunk.metadata.into(),
                    },
                    similarity_score: hit.similarity,
                })
                .collect(),
            total_chunks_searched: outcome.total_chunks_searched,
            query_time_ms: outcome.query_time_ms,
        }
    }
}

/// Search a library by embedding similarity
#[utoipa::path(
    post,
    path = "/api/v1/libraries/{library_id}/search",
    tag = "search",
    params(("library_id" = Uuid, Path, description = "Library id")),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Ranked results", body = SearchResponse),
        (status = 400, description = "Invalid k or min_similarity"),
        (status = 404, description = "Library not found"),
        (status = 502, description = "Embedding provider failure")
    )
)]
pub async fn search_library(
    State(state): State<AppState>,
    Path(library_id): Path<Uuid>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let library = state.registry.get(&library_id).await?;

    let embeddings = state
        .processor
        .provider()
        .embed(&[req.query_text])
        .await
        .map_err(|e| ApiError(e.into()))?;
    let query_vector = embeddings
        .into_iter()
        .next()
        .ok_or_else(|| ApiError(CoreError::EmbeddingProvider("empty embedding batch".into())))?;

    let outcome = library
        .search(&query_vector, req.k, req.min_similarity)
        .await?;
    Ok(Json(outcome.into()))
}

/// Create search routes.
pub fn search_routes() -> Router<AppState> {
    Router::new().route(
        "/api/v1/libraries/{library_id}/search",
        post(search_library),
    )
}
