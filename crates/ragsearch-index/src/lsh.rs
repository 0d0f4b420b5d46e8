//! Approximate index via random-hyperplane locality-sensitive hashing.
//!
//! Each of `num_tables` tables hashes a vector to a `num_hyperplanes`-bit
//! code (one sign bit per hyperplane). A query collects the union of its
//! matching buckets across tables and scores those candidates exactly by
//! cosine. Recall is a statistical property of the table/bit configuration;
//! an empty candidate union yields an empty result.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::kernel::{cosine, select_top_k};
use crate::{IndexKind, VectorIndex};

/// Random-hyperplane LSH index.
///
/// Hyperplane normals are sampled once, from a seeded RNG, when the vector
/// dimension first becomes known; they are fixed for the life of the index.
pub struct LshIndex {
    num_tables: usize,
    num_hyperplanes: usize,
    seed: u64,
    dimension: Option<usize>,
    /// `hyperplanes[table][plane]` is a normal of length `dimension`.
    /// Components are standard-normal; only the sign of the dot product is
    /// used, so the normals are left unnormalized.
    hyperplanes: Vec<Vec<Vec<f32>>>,
    /// Per-table bucket map: hash code -> ids in that bucket.
    tables: Vec<HashMap<u64, BTreeSet<Uuid>>>,
    /// Backing store for exact re-scoring and removal.
    points: BTreeMap<Uuid, Vec<f32>>,
}

impl LshIndex {
    /// Create an empty index with the given table/bit configuration.
    pub fn new(num_tables: usize, num_hyperplanes: usize, seed: u64) -> Self {
        Self {
            num_tables,
            num_hyperplanes,
            seed,
            dimension: None,
            hyperplanes: Vec::new(),
            tables: vec![HashMap::new(); num_tables],
            points: BTreeMap::new(),
        }
    }

    /// Sample hyperplanes on first contact with a concrete dimension.
    fn ensure_hyperplanes(&mut self, dimension: usize) {
        if self.dimension.is_some() {
            return;
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (num_tables, num_hyperplanes) = (self.num_tables, self.num_hyperplanes);
        self.hyperplanes = (0..num_tables)
            .map(|_| {
                (0..num_hyperplanes)
                    .map(|_| (0..dimension).map(|_| rng.sample(StandardNormal)).collect())
                    .collect()
            })
            .collect();
        self.dimension = Some(dimension);
        debug!(
            tables = self.num_tables,
            hyperplanes = self.num_hyperplanes,
            dimension,
            "sampled LSH hyperplanes"
        );
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != len => Err(Error::DimensionMismatch {
                expected,
                actual: len,
            }),
            _ => Ok(()),
        }
    }

    /// Hash code of `v` in the given table: one sign bit per hyperplane.
    fn hash_code(&self, table: usize, v: &[f32]) -> u64 {
        let mut code = 0u64;
        for (bit, normal) in self.hyperplanes[table].iter().enumerate() {
            let dot: f32 = normal.iter().zip(v.iter()).map(|(h, x)| h * x).sum();
            if dot >= 0.0 {
                code |= 1 << bit;
            }
        }
        code
    }

    fn insert_into_buckets(&mut self, id: Uuid, v: &[f32]) {
        for table in 0..self.num_tables {
            let code = self.hash_code(table, v);
            self.tables[table].entry(code).or_default().insert(id);
        }
    }

    fn remove_from_buckets(&mut self, id: &Uuid, v: &[f32]) {
        for table in 0..self.num_tables {
            let code = self.hash_code(table, v);
            if let Some(bucket) = self.tables[table].get_mut(&code) {
                bucket.remove(id);
                if bucket.is_empty() {
                    self.tables[table].remove(&code);
                }
            }
        }
    }
}

impl VectorIndex for LshIndex {
    fn build(&mut self, points: Vec<(Uuid, Vec<f32>)>) -> Result<()> {
        // Stage into fresh structures so a failed build leaves prior state
        // untouched.
        let mut staged: BTreeMap<Uuid, Vec<f32>> = BTreeMap::new();
        let mut dimension = None;
        for (id, v) in points {
            match dimension {
                None => dimension = Some(v.len()),
                Some(expected) if expected != v.len() => {
                    return Err(Error::DimensionMismatch {
                        expected,
                        actual: v.len(),
                    })
                }
                _ => {}
            }
            if staged.insert(id, v).is_some() {
                return Err(Error::AlreadyExists(id));
            }
        }

        // Build replaces all prior state, so hyperplanes are resampled for
        // the (possibly new) dimension. Same seed + same dimension gives
        // the same hyperplanes back.
        self.tables = vec![HashMap::new(); self.num_tables];
        self.points = BTreeMap::new();
        self.dimension = None;
        self.hyperplanes.clear();
        if let Some(dim) = dimension {
            self.ensure_hyperplanes(dim);
        }
        for (id, v) in staged {
            self.insert_into_buckets(id, &v);
            self.points.insert(id, v);
        }
        Ok(())
    }

    fn add(&mut self, id: Uuid, vector: Vec<f32>) -> Result<()> {
        self.check_dimension(vector.len())?;
        if self.points.contains_key(&id) {
            return Err(Error::AlreadyExists(id));
        }
        self.ensure_hyperplanes(vector.len());
        self.insert_into_buckets(id, &vector);
        self.points.insert(id, vector);
        Ok(())
    }

    fn remove(&mut self, id: &Uuid) -> bool {
        match self.points.remove(id) {
            Some(v) => {
                self.remove_from_buckets(id, &v);
                if self.points.is_empty() {
                    // An empty index has no established dimension; the next
                    // first add resamples for whatever dimension it brings.
                    self.dimension = None;
                    self.hyperplanes.clear();
                }
                true
            }
            None => false,
        }
    }

    fn query(&self, query: &[f32], k: usize, min_sim: f32) -> Result<Vec<(Uuid, f32)>> {
        if self.points.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(query.len())?;

        let mut candidates: BTreeSet<Uuid> = BTreeSet::new();
        for table in 0..self.num_tables {
            let code = self.hash_code(table, query);
            if let Some(bucket) = self.tables[table].get(&code) {
                candidates.extend(bucket.iter().copied());
            }
        }
        debug!(
            candidates = candidates.len(),
            total = self.points.len(),
            "LSH candidate set"
        );

        let scored = candidates
            .into_iter()
            .filter_map(|id| self.points.get(&id).map(|v| (id, cosine(query, v))))
            .collect();
        Ok(select_top_k(scored, k, min_sim))
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.points.contains_key(id)
    }

    fn ids(&self) -> Vec<Uuid> {
        self.points.keys().copied().collect()
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Lsh
    }
}
