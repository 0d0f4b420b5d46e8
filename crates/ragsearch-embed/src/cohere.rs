//! Cohere embedding provider.
//!
//! Thin JSON client for the Cohere `/v1/embed` endpoint. One POST embeds a
//! whole batch; the response must echo one vector per input text.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::{mask_api_key, EmbeddingProvider};

/// Default Cohere embedding model.
pub const DEFAULT_MODEL: &str = "embed-english-v3.0";

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.cohere.com";

/// Cohere provider configuration.
#[derive(Clone)]
pub struct CohereConfig {
    /// API key
    pub api_key: String,
    /// Embedding model
    pub model: String,
    /// Base URL (override for proxies and tests)
    pub base_url: String,
    /// Input type hint sent with every request
    pub input_type: String,
    /// Request timeout
    pub timeout: Duration,
}

// Custom Debug keeps the API key out of logs.
impl fmt::Debug for CohereConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CohereConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("input_type", &self.input_type)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CohereConfig {
    /// Create a configuration with an API key and defaults for the rest.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            input_type: "search_document".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create a configuration from the `COHERE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("COHERE_API_KEY")
            .map_err(|_| Error::NotConfigured("COHERE_API_KEY not set".to_string()))?;
        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("COHERE_EMBED_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Override the embedding model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Cohere HTTP embedding provider.
pub struct CohereProvider {
    config: CohereConfig,
    client: reqwest::Client,
}

impl CohereProvider {
    /// Create a provider from a configuration.
    ///
    /// A missing API key is tolerated here so the service can boot without
    /// a credential; embedding calls then fail with
    /// [`Error::NotConfigured`] at request time.
    pub fn new(config: CohereConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Strip credentials and upstream detail out of error text before it
    /// reaches API responses.
    fn sanitize(status: StatusCode, body: &str) -> String {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return "embedding API authentication failed".to_string();
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return "embedding API rate limit exceeded".to_string();
        }
        let detail: Option<String> = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));
        match detail {
            Some(message) if message.len() < 200 => format!("embedding API error: {message}"),
            _ => format!("embedding API returned status {status}"),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for CohereProvider {
    #[instrument(skip(self, texts), fields(batch = texts.len(), model = %self.config.model))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if self.config.api_key.is_empty() {
            return Err(Error::NotConfigured(
                "COHERE_API_KEY is not set".to_string(),
            ));
        }

        let request = EmbedRequest {
            model: &self.config.model,
            texts,
            input_type: &self.config.input_type,
        };
        let url = format!("{}/v1/embed", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Network("embedding request timed out".to_string())
                } else {
                    Error::Network("embedding request failed".to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(Self::sanitize(status, &body)));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(format!("malformed embed response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        if let Some(first) = parsed.embeddings.first() {
            if first.is_empty() || parsed.embeddings.iter().any(|e| e.len() != first.len()) {
                return Err(Error::InvalidResponse(
                    "embeddings have inconsistent dimensions".to_string(),
                ));
            }
        }

        debug!(
            batch = texts.len(),
            dimension = parsed.embeddings.first().map_or(0, Vec::len),
            "embedded batch"
        );
        Ok(parsed.embeddings)
    }

    fn name(&self) -> &str {
        "cohere"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> CohereProvider {
        let config = CohereConfig::new("test-key").with_base_url(server.uri());
        CohereProvider::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_empty_key_fails_at_request_time() {
        let provider = CohereProvider::new(CohereConfig::new("")).unwrap();
        let err = provider.embed(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = CohereConfig::new("co-super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_embed_batch_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_MODEL,
                "texts": ["alpha", "beta"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 0.0], [0.0, 1.0]],
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let out = provider
            .embed(&["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_embed_empty_batch_skips_request() {
        let server = MockServer::start().await;
        let provider = provider_for(&server);
        assert!(provider.embed(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auth_error_sanitized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "message": "invalid api token co-super-secret",
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.embed(&["x".to_string()]).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("authentication"));
        assert!(!text.contains("co-super-secret"));
    }

    #[tokio::test]
    async fn test_length_mismatch_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 0.0]],
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_inconsistent_dimensions_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 0.0], [0.5]],
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }
}
