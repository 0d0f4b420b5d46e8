//! Deterministic local embedding provider.
//!
//! Hashes each text into an RNG seed and draws a normalized
//! standard-normal vector from it, so the same text always maps to the
//! same unit vector. No semantic content, but the full shape of the
//! provider contract — fixed dimension, batch order, determinism — which
//! makes it the test and demo provider, and a way to run the service
//! without a credential.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::Result;
use crate::EmbeddingProvider;

/// Default embedding dimension (matches common sentence-transformer models).
pub const DEFAULT_DIMENSION: usize = 384;

/// Hash-seeded deterministic embedding provider.
#[derive(Debug, Clone)]
pub struct HashProvider {
    dimension: usize,
}

impl HashProvider {
    /// Create a provider with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// The provider's fixed output dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        let v: Vec<f32> = (0..self.dimension)
            .map(|_| rng.sample(StandardNormal))
            .collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.into_iter().map(|x| x / norm).collect()
        } else {
            // Astronomically unlikely; fall back to a fixed axis.
            let mut axis = vec![0.0; self.dimension];
            axis[0] = 1.0;
            axis
        }
    }
}

impl Default for HashProvider {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn name(&self) -> &str {
        "hash"
    }

    fn model(&self) -> &str {
        "seeded-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let provider = HashProvider::new(64);
        let texts = vec!["hello".to_string(), "world".to_string()];
        let a = provider.embed(&texts).await.unwrap();
        let b = provider.embed(&texts).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_distinct_texts_distinct_vectors() {
        let provider = HashProvider::default();
        let out = provider
            .embed(&["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();
        assert_ne!(out[0], out[1]);
    }

    #[tokio::test]
    async fn test_unit_normalized() {
        let provider = HashProvider::new(128);
        let out = provider.embed(&["some text".to_string()]).await.unwrap();
        let norm: f32 = out[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(out[0].len(), 128);
    }

    #[tokio::test]
    async fn test_batch_order_preserved() {
        let provider = HashProvider::new(32);
        let texts: Vec<String> = (0..10).map(|i| format!("text {i}")).collect();
        let batch = provider.embed(&texts).await.unwrap();
        for (i, text) in texts.iter().enumerate() {
            let single = provider.embed(&[text.clone()]).await.unwrap();
            assert_eq!(batch[i], single[0]);
        }
    }
}
