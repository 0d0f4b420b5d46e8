//! Similarity kernel: cosine on unit-normalized vectors.
//!
//! Every vector stored in an index is L2-normalized at ingest, so cosine
//! similarity reduces to a dot product. The kernel also provides the shared
//! top-k selection used by all index implementations.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Tolerance for unit-norm checks.
pub const EPSILON: f32 = 1e-6;

/// Norms below this are treated as zero.
const ZERO_NORM: f32 = 1e-12;

/// Normalize a vector to unit L2 length.
///
/// Returns [`Error::DegenerateVector`] when the input norm is zero or
/// near-zero (no direction to preserve).
pub fn normalize(v: &[f32]) -> Result<Vec<f32>> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < ZERO_NORM {
        return Err(Error::DegenerateVector);
    }
    Ok(v.iter().map(|x| x / norm).collect())
}

/// Cosine similarity of two already-normalized vectors (plain dot product).
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Whether a vector is unit-normalized within [`EPSILON`].
pub fn is_normalized(v: &[f32]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    (norm - 1.0).abs() <= EPSILON
}

/// Shared result selection: filter by `min_sim`, order by similarity
/// descending with ascending-id tie-break, keep at most `k`.
pub(crate) fn select_top_k(
    mut scored: Vec<(Uuid, f32)>,
    k: usize,
    min_sim: f32,
) -> Vec<(Uuid, f32)> {
    scored.retain(|(_, sim)| *sim >= min_sim);
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}
