//! Vector index family for ragsearch.
//!
//! Three interchangeable nearest-neighbor indexes behind one contract:
//!
//! - [`NaiveIndex`] — exact linear scan, O(n·d) per query. Best below ~1k points.
//! - [`LshIndex`] — approximate random-hyperplane hashing. Sub-linear candidate
//!   sets, may miss true neighbors.
//! - [`VpTreeIndex`] — exact vantage-point tree with triangle-inequality pruning.
//!
//! All three operate on unit-normalized vectors and score by cosine
//! similarity (dot product). Construction goes through [`IndexKind::create`]
//! so callers depend only on the [`VectorIndex`] capability:
//!
//! ```
//! use ragsearch_index::{IndexKind, IndexParams, kernel};
//! use uuid::Uuid;
//!
//! let mut index = IndexKind::Lsh.create(&IndexParams::default()).unwrap();
//! let id = Uuid::new_v4();
//! index.add(id, kernel::normalize(&[1.0; 32]).unwrap()).unwrap();
//! let hits = index.query(&kernel::normalize(&[1.0; 32]).unwrap(), 1, 0.0).unwrap();
//! assert_eq!(hits[0].0, id);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod kernel;
mod lsh;
mod naive;
mod vptree;

pub use error::{Error, Result};
pub use lsh::LshIndex;
pub use naive::NaiveIndex;
pub use vptree::VpTreeIndex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default RNG seed for LSH hyperplanes and VPTREE vantage sampling.
///
/// Fixed so that index structure is reproducible across runs given the same
/// insertion order.
pub const DEFAULT_SEED: u64 = 42;

/// Common contract for the nearest-neighbor index family.
///
/// Indexes own their internal structure only; chunk records live in the
/// enclosing library's chunk store. Callers must pass unit-normalized
/// vectors (see [`kernel::normalize`]); all mutation is expected to happen
/// under the enclosing library's write lock.
pub trait VectorIndex: Send + Sync {
    /// Replace all prior state with the given points.
    ///
    /// Idempotent on identical input up to tie-break order.
    fn build(&mut self, points: Vec<(Uuid, Vec<f32>)>) -> Result<()>;

    /// Insert a single point. The id must be new.
    fn add(&mut self, id: Uuid, vector: Vec<f32>) -> Result<()>;

    /// Remove a point, returning whether it was present. Absent ids are a
    /// tolerated no-op.
    fn remove(&mut self, id: &Uuid) -> bool;

    /// k-nearest-neighbor query against a unit-normalized vector.
    ///
    /// Returns at most `k` `(id, similarity)` pairs with
    /// `similarity >= min_sim`, ordered by similarity descending and
    /// ascending id on ties. An empty index yields an empty result.
    fn query(&self, query: &[f32], k: usize, min_sim: f32) -> Result<Vec<(Uuid, f32)>>;

    /// Number of points currently indexed.
    fn len(&self) -> usize;

    /// Whether the index holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the id is currently indexed.
    fn contains(&self, id: &Uuid) -> bool;

    /// All indexed ids, ascending. Used for coherence checks against the
    /// chunk store.
    fn ids(&self) -> Vec<Uuid>;

    /// Which implementation this is.
    fn kind(&self) -> IndexKind;
}

/// The available index implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact linear scan
    Naive,
    /// Random-hyperplane locality-sensitive hashing (approximate)
    Lsh,
    /// Vantage-point tree (exact)
    VpTree,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Naive => write!(f, "naive"),
            Self::Lsh => write!(f, "lsh"),
            Self::VpTree => write!(f, "vptree"),
        }
    }
}

impl std::str::FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(Self::Naive),
            "lsh" => Ok(Self::Lsh),
            "vptree" => Ok(Self::VpTree),
            other => Err(Error::InvalidParameter(format!(
                "unknown index type '{other}' (expected naive, lsh, or vptree)"
            ))),
        }
    }
}

impl IndexKind {
    /// Construct a boxed index of this kind, validating `params` first.
    pub fn create(self, params: &IndexParams) -> Result<Box<dyn VectorIndex>> {
        params.validate(self)?;
        Ok(match self {
            Self::Naive => Box::new(NaiveIndex::new()),
            Self::Lsh => Box::new(LshIndex::new(
                params.num_tables,
                params.num_hyperplanes,
                params.seed,
            )),
            Self::VpTree => Box::new(VpTreeIndex::new(params.leaf_size, params.seed)),
        })
    }
}

/// Tuning parameters for the index family.
///
/// Each implementation reads only the fields it recognizes; the rest are
/// ignored. Unknown fields in serialized input are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexParams {
    /// LSH: number of independent hash tables
    pub num_tables: usize,
    /// LSH: bits per hash code per table (1..=64)
    pub num_hyperplanes: usize,
    /// VPTREE: maximum points in a leaf before splitting
    pub leaf_size: usize,
    /// RNG seed for hyperplane / vantage-point sampling
    pub seed: u64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            num_tables: 8,
            num_hyperplanes: 8,
            leaf_size: 16,
            seed: DEFAULT_SEED,
        }
    }
}

impl IndexParams {
    /// Validate the fields relevant to `kind`.
    pub fn validate(&self, kind: IndexKind) -> Result<()> {
        match kind {
            IndexKind::Naive => Ok(()),
            IndexKind::Lsh => {
                if self.num_tables == 0 {
                    return Err(Error::InvalidParameter(
                        "num_tables must be at least 1".into(),
                    ));
                }
                if self.num_hyperplanes == 0 || self.num_hyperplanes > 64 {
                    return Err(Error::InvalidParameter(
                        "num_hyperplanes must be in 1..=64".into(),
                    ));
                }
                Ok(())
            }
            IndexKind::VpTree => {
                if self.leaf_size == 0 {
                    return Err(Error::InvalidParameter(
                        "leaf_size must be at least 1".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [IndexKind::Naive, IndexKind::Lsh, IndexKind::VpTree] {
            let s = kind.to_string();
            assert_eq!(s.parse::<IndexKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_unknown_rejected() {
        assert!("hnsw".parse::<IndexKind>().is_err());
    }

    #[test]
    fn test_kind_serde_lowercase() {
        let json = serde_json::to_string(&IndexKind::VpTree).unwrap();
        assert_eq!(json, "\"vptree\"");
    }

    #[test]
    fn test_params_validation() {
        let mut params = IndexParams::default();
        assert!(params.validate(IndexKind::Lsh).is_ok());

        params.num_hyperplanes = 65;
        assert!(params.validate(IndexKind::Lsh).is_err());
        assert!(params.validate(IndexKind::Naive).is_ok());

        params = IndexParams {
            leaf_size: 0,
            ..IndexParams::default()
        };
        assert!(params.validate(IndexKind::VpTree).is_err());
    }

    #[test]
    fn test_params_reject_unknown_fields() {
        let res: std::result::Result<IndexParams, _> =
            serde_json::from_str(r#"{"num_probes": 3}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_create_each_kind() {
        let params = IndexParams::default();
        for kind in [IndexKind::Naive, IndexKind::Lsh, IndexKind::VpTree] {
            let index = kind.create(&params).unwrap();
            assert_eq!(index.kind(), kind);
            assert!(index.is_empty());
        }
    }
}
