//! End-to-end tests over the HTTP surface.
//!
//! These drive the real axum router — the same one the binary serves —
//! with the deterministic hash provider, covering the full document
//! lifecycle, the error-to-status mapping, and the CORS configuration.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use ragsearch::server::{build_cors, build_router, AppConfig, AppState};
use ragsearch_embed::HashProvider;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    let state = AppState::with_provider(Arc::new(HashProvider::new(64)));
    build_router(state, &AppConfig::default()).unwrap()
}

async fn send(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ============================================================================
// Full Lifecycle over HTTP
// ============================================================================

#[tokio::test]
async fn test_create_ingest_search_update_delete_over_http() {
    let app = test_app();

    // Create a library.
    let (status, library) = send(
        &app,
        Method::POST,
        "/api/v1/libraries",
        Some(json!({"name": "kb", "index_type": "vptree", "username": "ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(library["index_type"], "vptree");
    assert_eq!(library["chunk_count"], 0);
    let lib_id = library["id"].as_str().unwrap().to_string();

    // Ingest a single-chunk document.
    let text = "rust ownership and borrowing";
    let (status, doc) = send(
        &app,
        Method::POST,
        &format!("/api/v1/libraries/{lib_id}/documents"),
        Some(json!({"text": text})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["chunk_count"], 1);
    let doc_id = doc["document_id"].as_str().unwrap().to_string();

    // An identical query embeds to the identical vector: similarity 1.
    let (status, found) = send(
        &app,
        Method::POST,
        &format!("/api/v1/libraries/{lib_id}/search"),
        Some(json!({"query_text": text, "k": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["total_chunks_searched"], 1);
    assert!(found["query_time_ms"].is_number());
    let hit = &found["results"][0];
    assert_eq!(hit["chunk"]["text"], text);
    assert_eq!(hit["chunk"]["document_id"].as_str().unwrap(), doc_id);
    assert!(hit["similarity_score"].as_f64().unwrap() > 0.9999);
    // Chunk metadata is nested, with both timestamps.
    assert!(hit["chunk"]["metadata"]["created_at"].is_string());
    assert!(hit["chunk"]["metadata"]["updated_at"].is_string());
    assert!(hit["chunk"]["metadata"]["tags"].is_array());

    // Replace the document's text.
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/libraries/{lib_id}/documents/{doc_id}"),
        Some(json!({"text": "entirely new content"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["chunk_count"], 1);

    // The old chunk is gone; searching its text no longer matches exactly.
    let (_, after) = send(
        &app,
        Method::POST,
        &format!("/api/v1/libraries/{lib_id}/search"),
        Some(json!({"query_text": text, "k": 5, "min_similarity": -1.0})),
    )
    .await;
    for hit in after["results"].as_array().unwrap() {
        assert_ne!(hit["chunk"]["text"], text);
    }

    // Delete the document, then the library.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/libraries/{lib_id}/documents/{doc_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, info) = send(&app, Method::GET, &format!("/api/v1/libraries/{lib_id}"), None).await;
    assert_eq!(info["chunk_count"], 0);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/libraries/{lib_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/libraries/{lib_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_library_listing_and_metadata_update() {
    let app = test_app();

    let (_, a) = send(
        &app,
        Method::POST,
        "/api/v1/libraries",
        Some(json!({"name": "a", "index_type": "naive"})),
    )
    .await;
    let (_, _b) = send(
        &app,
        Method::POST,
        "/api/v1/libraries",
        Some(json!({"name": "b", "index_type": "lsh"})),
    )
    .await;

    let (status, listed) = send(&app, Method::GET, "/api/v1/libraries", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let lib_id = a["id"].as_str().unwrap();
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/libraries/{lib_id}"),
        Some(json!({"username": "grace", "tags": ["prod"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["username"], "grace");
    assert_eq!(updated["tags"][0], "prod");
}

// ============================================================================
// Error Mapping
// ============================================================================

#[tokio::test]
async fn test_error_mapping() {
    let app = test_app();
    let ghost = uuid::Uuid::new_v4();

    // Unknown library -> 404 not_found.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/libraries/{ghost}/search"),
        Some(json!({"query_text": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    // Unknown index type -> 400 invalid_parameter.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/libraries",
        Some(json!({"name": "lib", "index_type": "hnsw"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_parameter");

    // k = 0 -> 400 invalid_parameter.
    let (_, library) = send(
        &app,
        Method::POST,
        "/api/v1/libraries",
        Some(json!({"name": "lib", "index_type": "naive"})),
    )
    .await;
    let lib_id = library["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/libraries/{lib_id}/search"),
        Some(json!({"query_text": "x", "k": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_parameter");

    // Updating a document that was never ingested -> 404.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/libraries/{lib_id}/documents/{ghost}"),
        Some(json!({"text": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

// ============================================================================
// CORS Configuration
// ============================================================================

#[tokio::test]
async fn test_cors_permissive_default() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header(header::ORIGIN, "https://anywhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_cors_explicit_origin_list() {
    let config = AppConfig {
        cors_origins: vec!["https://app.example.com".to_string()],
        ..AppConfig::default()
    };
    let state = AppState::with_provider(Arc::new(HashProvider::new(64)));
    let app = build_router(state, &config).unwrap();

    let allowed = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("https://app.example.com")
    );

    let denied = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(denied).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[test]
fn test_cors_invalid_origin_rejected_at_parse() {
    assert!(build_cors(&["not a\u{0}header".to_string()]).is_err());
    assert!(build_cors(&["https://ok.example.com".to_string()]).is_ok());
}
