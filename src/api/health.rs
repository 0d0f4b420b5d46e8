//! Health check endpoints.
//!
//! Provides:
//! - `/` — liveness message (for load balancers)
//! - `/health` — status, version, and the endpoint map

use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use utoipa::ToSchema;

use crate::server::AppState;

/// Root liveness response
#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    /// Liveness message
    pub message: &'static str,
}

/// Detailed health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status
    pub status: &'static str,
    /// Service identifier
    pub service: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Main endpoint map
    pub endpoints: EndpointMap,
}

/// Endpoints advertised by the health check
#[derive(Debug, Serialize, ToSchema)]
pub struct EndpointMap {
    /// Library CRUD
    pub libraries: &'static str,
    /// Document ingest / update / delete
    pub documents: &'static str,
    /// Semantic search
    pub search: &'static str,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service is running", body = RootResponse))
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "RAGSearch Engine is running",
    })
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service health detail", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "ragsearch-engine",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: EndpointMap {
            libraries: "/api/v1/libraries",
            documents: "/api/v1/libraries/{library_id}/documents",
            search: "/api/v1/libraries/{library_id}/search",
        },
    })
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(root)).route("/health", get(health))
}
