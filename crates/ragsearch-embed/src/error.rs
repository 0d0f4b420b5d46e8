//! Error types for embedding providers.

use thiserror::Error;

/// Embedding provider error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured (missing credential or endpoint)
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Upstream provider failure (HTTP error, malformed response)
    #[error("provider error: {0}")]
    Provider(String),

    /// Network-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Response shape violated the provider contract
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
