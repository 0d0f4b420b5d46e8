//! Embedding providers for ragsearch.
//!
//! Providers convert text into dense vector representations for semantic
//! similarity search:
//!
//! - [`CohereProvider`] — remote HTTP provider (the production path).
//! - [`HashProvider`] — deterministic local provider for tests, demos, and
//!   running without a credential.
//!
//! The contract is batch-shaped: the returned sequence has the same length
//! and order as the input and every vector has the provider's fixed
//! dimension. Providers are assumed remote and possibly slow; callers
//! should finish provider calls before taking any library lock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cohere;
pub mod error;
pub mod hash;

pub use cohere::{CohereConfig, CohereProvider};
pub use error::{Error, Result};
pub use hash::HashProvider;

use async_trait::async_trait;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts.
    ///
    /// The result has the same length and order as `texts`; all vectors
    /// share one fixed dimension. Any upstream failure surfaces as an
    /// [`Error`] and no partial result is returned.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Provider name (e.g. `"cohere"`).
    fn name(&self) -> &str;

    /// Model identifier used for embedding.
    fn model(&self) -> &str;
}

/// Mask an API key for logs and Debug output, keeping only a short prefix.
pub(crate) fn mask_api_key(key: &str) -> String {
    if key.len() <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("{}…", &key[..4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("abc"), "[REDACTED]");
        assert_eq!(mask_api_key("co-secret-key"), "co-s…");
    }
}
