//! Server wiring: shared state, provider selection, router assembly.

pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use ragsearch_core::{DocumentProcessor, Registry};
use ragsearch_embed::{CohereConfig, CohereProvider, EmbeddingProvider, HashProvider};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api;
pub use config::{AppConfig, EmbeddingConfig, LogConfig, LogFormat, ServerConfig};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide library registry
    pub registry: Arc<Registry>,
    /// Document processor over the configured embedding provider
    pub processor: Arc<DocumentProcessor>,
}

impl AppState {
    /// Build state from configuration: construct the registry and select
    /// the embedding provider.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = build_provider(&config.embedding)?;
        info!(
            provider = provider.name(),
            model = provider.model(),
            "embedding provider ready"
        );
        Ok(Self {
            registry: Arc::new(Registry::new()),
            processor: Arc::new(DocumentProcessor::new(provider)),
        })
    }

    /// State over an explicit provider (integration tests use the hash
    /// provider here to stay off the network).
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            processor: Arc::new(DocumentProcessor::new(provider)),
        }
    }
}

fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "cohere" => {
            let cohere_config = match CohereConfig::from_env() {
                Ok(mut c) => {
                    if let Some(model) = &config.model {
                        c.model = model.clone();
                    }
                    c
                }
                Err(_) => {
                    warn!(
                        "COHERE_API_KEY not found in environment. Embedding \
                         operations will fail at runtime; set COHERE_API_KEY \
                         or switch embedding.provider to \"hash\"."
                    );
                    CohereConfig::new("")
                }
            };
            let provider =
                CohereProvider::new(cohere_config).context("failed to build Cohere client")?;
            Ok(Arc::new(provider))
        }
        "hash" => Ok(Arc::new(HashProvider::new(config.dimension))),
        other => anyhow::bail!("unknown embedding provider '{other}' (expected cohere or hash)"),
    }
}

/// Build the CORS layer from the configured origin list. `"*"` anywhere in
/// the list means fully permissive.
pub fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<_>>()?;
    Ok(CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Assemble the full application router.
pub fn build_router(state: AppState, config: &AppConfig) -> Result<Router> {
    let cors = build_cors(&config.cors_origins)?;
    Ok(api::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cors_permissive() {
        assert!(build_cors(&["*".to_string()]).is_ok());
        assert!(build_cors(&[]).is_ok());
    }

    #[test]
    fn test_build_cors_explicit_origins() {
        let origins = vec!["https://example.com".to_string()];
        assert!(build_cors(&origins).is_ok());
    }

    #[test]
    fn test_build_cors_invalid_origin_rejected() {
        let origins = vec!["not a\u{0}header".to_string()];
        assert!(build_cors(&origins).is_err());
    }

    #[test]
    fn test_build_provider_hash() {
        let config = EmbeddingConfig {
            provider: "hash".to_string(),
            model: None,
            dimension: 64,
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "hash");
    }

    #[test]
    fn test_build_provider_unknown_rejected() {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            model: None,
            dimension: 64,
        };
        assert!(build_provider(&config).is_err());
    }
}
