//! Exact index via a vantage-point tree.
//!
//! Internal nodes hold a randomly sampled vantage point and the median
//! distance to it; the near subtree holds points within the median, the far
//! subtree the rest. Queries descend best-first and enter the far side only
//! when the triangle inequality says it can still improve the k-th best.
//!
//! Distances are chord lengths between unit vectors (`‖x − y‖₂`, a true
//! metric and order-equivalent to cosine similarity), so the pruning bound
//! is sound; reported scores are exact cosine. Removals tombstone the id
//! and the tree is rebuilt from live points once tombstones exceed a
//! quarter of it.

use std::collections::{BTreeMap, HashSet};
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::kernel::{cosine, select_top_k};
use crate::{IndexKind, VectorIndex};

/// Chord distance between unit vectors, derived from their cosine.
fn chord(sim: f32) -> f32 {
    (2.0 * (1.0 - sim)).max(0.0).sqrt()
}

enum Node {
    Leaf(Vec<(Uuid, Vec<f32>)>),
    Inner {
        vantage_id: Uuid,
        vantage: Vec<f32>,
        /// Median chord distance from the vantage point to its subtree.
        threshold: f32,
        /// Points with distance <= threshold.
        near: Box<Node>,
        /// Points with distance > threshold.
        far: Box<Node>,
    },
}

/// Vantage-point tree index.
pub struct VpTreeIndex {
    leaf_size: usize,
    dimension: Option<usize>,
    root: Node,
    /// Live points; the source of truth for membership and rebuilds.
    live: BTreeMap<Uuid, Vec<f32>>,
    /// Removed ids whose tree slots have not been reclaimed yet.
    tombstones: HashSet<Uuid>,
    rng: StdRng,
}

impl VpTreeIndex {
    /// Create an empty index.
    pub fn new(leaf_size: usize, seed: u64) -> Self {
        Self {
            leaf_size,
            dimension: None,
            root: Node::Leaf(Vec::new()),
            live: BTreeMap::new(),
            tombstones: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
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

    /// Recursive median-split construction.
    fn build_node(leaf_size: usize, rng: &mut StdRng, mut points: Vec<(Uuid, Vec<f32>)>) -> Node {
        if points.len() <= leaf_size {
            return Node::Leaf(points);
        }

        let pick = rng.gen_range(0..points.len());
        let (vantage_id, vantage) = points.swap_remove(pick);

        let with_dist: Vec<(f32, (Uuid, Vec<f32>))> = points
            .into_iter()
            .map(|(id, v)| (chord(cosine(&vantage, &v)), (id, v)))
            .collect();
        let mut dists: Vec<f32> = with_dist.iter().map(|(d, _)| *d).collect();
        dists.sort_by(f32::total_cmp);
        let threshold = dists[(dists.len() - 1) / 2];

        let (near, far): (Vec<_>, Vec<_>) =
            with_dist.into_iter().partition(|(d, _)| *d <= threshold);
        let near: Vec<_> = near.into_iter().map(|(_, p)| p).collect();
        let far: Vec<_> = far.into_iter().map(|(_, p)| p).collect();

        Node::Inner {
            vantage_id,
            vantage,
            threshold,
            near: Box::new(Self::build_node(leaf_size, rng, near)),
            far: Box::new(Self::build_node(leaf_size, rng, far)),
        }
    }

    /// Descend to the owning leaf, append, and split the leaf when it
    /// overflows `leaf_size`.
    fn insert_node(leaf_size: usize, rng: &mut StdRng, node: &mut Node, id: Uuid, v: Vec<f32>) {
        match node {
            Node::Leaf(points) => {
                points.push((id, v));
                if points.len() > leaf_size {
                    let points = std::mem::take(points);
                    *node = Self::build_node(leaf_size, rng, points);
                }
            }
            Node::Inner {
                vantage,
                threshold,
                near,
                far,
                ..
            } => {
                let d = chord(cosine(vantage, &v));
                if d <= *threshold {
                    Self::insert_node(leaf_size, rng, near, id, v);
                } else {
                    Self::insert_node(leaf_size, rng, far, id, v);
                }
            }
        }
    }

    /// Drop tombstoned slots by rebuilding the tree from live points.
    fn rebuild(&mut self) {
        let points: Vec<(Uuid, Vec<f32>)> =
            self.live.iter().map(|(id, v)| (*id, v.clone())).collect();
        debug!(live = points.len(), swept = self.tombstones.len(), "rebuilding vp-tree");
        self.root = Self::build_node(self.leaf_size, &mut self.rng, points);
        self.tombstones.clear();
    }

    fn tombstone_share_exceeded(&self) -> bool {
        self.tombstones.len() * 4 > self.live.len() + self.tombstones.len()
    }

    fn walk<'a>(&'a self, node: &'a Node, query: &[f32], best: &mut KBest) {
        match node {
            Node::Leaf(points) => {
                for (id, v) in points {
                    if !self.tombstones.contains(id) {
                        best.offer(cosine(query, v), *id);
                    }
                }
            }
            Node::Inner {
                vantage_id,
                vantage,
                threshold,
                near,
                far,
            } => {
                let sim = cosine(query, vantage);
                let d = chord(sim);
                if !self.tombstones.contains(vantage_id) {
                    best.offer(sim, *vantage_id);
                }
                let (first, second) = if d <= *threshold {
                    (near.as_ref(), far.as_ref())
                } else {
                    (far.as_ref(), near.as_ref())
                };
                self.walk(first, query, best);
                // The other side can only hold an improvement when the
                // query ball of radius tau crosses the split boundary.
                if (d - *threshold).abs() <= best.tau() {
                    self.walk(second, query, best);
                }
            }
        }
    }
}

impl VectorIndex for VpTreeIndex {
    fn build(&mut self, points: Vec<(Uuid, Vec<f32>)>) -> Result<()> {
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

        self.dimension = dimension;
        self.live = staged;
        self.tombstones.clear();
        let points: Vec<(Uuid, Vec<f32>)> =
            self.live.iter().map(|(id, v)| (*id, v.clone())).collect();
        self.root = Self::build_node(self.leaf_size, &mut self.rng, points);
        Ok(())
    }

    fn add(&mut self, id: Uuid, vector: Vec<f32>) -> Result<()> {
        self.check_dimension(vector.len())?;
        if self.live.contains_key(&id) {
            return Err(Error::AlreadyExists(id));
        }
        // A re-added tombstoned id would collide with its stale tree slot;
        // sweep first so the id appears exactly once.
        if self.tombstones.contains(&id) {
            self.tombstones.remove(&id);
            self.rebuild();
        }
        self.dimension.get_or_insert(vector.len());
        self.live.insert(id, vector.clone());
        Self::insert_node(self.leaf_size, &mut self.rng, &mut self.root, id, vector);
        Ok(())
    }

    fn remove(&mut self, id: &Uuid) -> bool {
        if self.live.remove(id).is_none() {
            return false;
        }
        if self.live.is_empty() {
            // Nothing left: drop the stale tree outright instead of
            // tombstoning, and forget the established dimension.
            self.root = Node::Leaf(Vec::new());
            self.tombstones.clear();
            self.dimension = None;
            return true;
        }
        self.tombstones.insert(*id);
        if self.tombstone_share_exceeded() {
            self.rebuild();
        }
        true
    }

    fn query(&self, query: &[f32], k: usize, min_sim: f32) -> Result<Vec<(Uuid, f32)>> {
        if self.live.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(query.len())?;

        let mut best = KBest::new(k);
        self.walk(&self.root, query, &mut best);
        Ok(select_top_k(best.into_scored(), k, min_sim))
    }

    fn len(&self) -> usize {
        self.live.len()
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.live.contains_key(id)
    }

    fn ids(&self) -> Vec<Uuid> {
        self.live.keys().copied().collect()
    }

    fn kind(&self) -> IndexKind {
        IndexKind::VpTree
    }
}

/// Bounded best-k candidate set ordered worst-out.
///
/// The heap's top is the current worst candidate: lowest similarity, and on
/// equal similarity the largest id, so boundary ties resolve toward the
/// ascending-id contract.
struct KBest {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

struct Candidate {
    sim: f32,
    id: Uuid,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.sim == other.sim && self.id == other.id
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Lower similarity is "greater" (worse); among equals, larger id.
        other
            .sim
            .total_cmp(&self.sim)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl KBest {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::new(),
        }
    }

    /// Current k-th best as a chord-distance bound; infinite until k found.
    fn tau(&self) -> f32 {
        if self.heap.len() < self.k {
            f32::INFINITY
        } else {
            self.heap.peek().map_or(f32::INFINITY, |worst| chord(worst.sim))
        }
    }

    fn offer(&mut self, sim: f32, id: Uuid) {
        if self.heap.len() < self.k {
            self.heap.push(Candidate { sim, id });
            return;
        }
        let Some(worst) = self.heap.peek() else {
            return;
        };
        let improves =
            sim > worst.sim || (sim == worst.sim && id < worst.id);
        if improves {
            self.heap.pop();
            self.heap.push(Candidate { sim, id });
        }
    }

    fn into_scored(self) -> Vec<(Uuid, f32)> {
        self.heap.into_iter().map(|c| (c.id, c.sim)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::normalize;
    use crate::naive::NaiveIndex;
    use crate::DEFAULT_SEED;
    use rand_distr::StandardNormal;

    fn default_index() -> VpTreeIndex {
        VpTreeIndex::new(16, DEFAULT_SEED)
    }

    fn random_unit(rng: &mut StdRng, dim: usize) -> Vec<f32> {
        let v: Vec<f32> = (0..dim).map(|_| rng.sample(StandardNormal)).collect();
        normalize(&v).unwrap()
    }

    fn random_points(seed: u64, n: usize, dim: usize) -> Vec<(Uuid, Vec<f32>)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| (Uuid::new_v4(), random_unit(&mut rng, dim))).collect()
    }

    #[test]
    fn test_empty_query() {
        let index = default_index();
        assert!(index.query(&[1.0, 0.0], 5, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_self_retrieval_all_points() {
        let mut index = VpTreeIndex::new(4, DEFAULT_SEED);
        let points = random_points(3, 100, 32);
        index.build(points.clone()).unwrap();
        for (id, v) in &points {
            let hits = index.query(v, 1, 0.0).unwrap();
            assert_eq!(hits[0].0, *id);
            assert!(hits[0].1 >= 1.0 - 1e-6);
        }
    }

    #[test]
    fn test_matches_naive_exactly() {
        let points = random_points(17, 200, 16);
        let mut naive = NaiveIndex::new();
        let mut vptree = VpTreeIndex::new(8, DEFAULT_SEED);
        naive.build(points.clone()).unwrap();
        vptree.build(points).unwrap();

        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let q = random_unit(&mut rng, 16);
            let expected = naive.query(&q, 10, 0.0).unwrap();
            let actual = vptree.query(&q, 10, 0.0).unwrap();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_matches_naive_with_min_sim() {
        let points = random_points(5, 80, 8);
        let mut naive = NaiveIndex::new();
        let mut vptree = VpTreeIndex::new(4, DEFAULT_SEED);
        naive.build(points.clone()).unwrap();
        vptree.build(points).unwrap();

        let mut rng = StdRng::seed_from_u64(6);
        let q = random_unit(&mut rng, 8);
        assert_eq!(
            vptree.query(&q, 25, 0.1).unwrap(),
            naive.query(&q, 25, 0.1).unwrap()
        );
    }

    #[test]
    fn test_build_equals_incremental_add() {
        let mut points = random_points(23, 60, 12);
        points.sort_by(|a, b| a.0.cmp(&b.0));

        let mut built = VpTreeIndex::new(6, DEFAULT_SEED);
        built.build(points.clone()).unwrap();

        let mut incremental = VpTreeIndex::new(6, DEFAULT_SEED);
        for (id, v) in points {
            incremental.add(id, v).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..10 {
            let q = random_unit(&mut rng, 12);
            assert_eq!(
                built.query(&q, 5, 0.0).unwrap(),
                incremental.query(&q, 5, 0.0).unwrap()
            );
        }
    }

    #[test]
    fn test_remove_tombstones_then_rebuild() {
        let mut index = VpTreeIndex::new(4, DEFAULT_SEED);
        let points = random_points(41, 40, 8);
        index.build(points.clone()).unwrap();

        // Remove a third of the points; the 25% threshold forces at least
        // one sweep along the way.
        for (id, _) in points.iter().take(13) {
            assert!(index.remove(id));
        }
        assert_eq!(index.len(), 27);

        for (id, v) in points.iter().skip(13) {
            let hits = index.query(v, 1, 0.0).unwrap();
            assert_eq!(hits[0].0, *id, "surviving point must remain retrievable");
        }
        for (id, _) in points.iter().take(13) {
            assert!(!index.contains(id));
        }
    }

    #[test]
    fn test_removed_points_never_returned() {
        let mut index = default_index();
        let points = random_points(8, 20, 8);
        index.build(points.clone()).unwrap();
        let (gone, v) = (&points[0].0, &points[0].1);
        index.remove(gone);
        let hits = index.query(v, 20, -1.0).unwrap();
        assert!(hits.iter().all(|(id, _)| id != gone));
        assert_eq!(hits.len(), 19);
    }

    #[test]
    fn test_readd_after_remove() {
        let mut index = VpTreeIndex::new(2, DEFAULT_SEED);
        let points = random_points(13, 10, 4);
        index.build(points.clone()).unwrap();

        let (id, old) = points[0].clone();
        index.remove(&id);
        let fresh = normalize(&[9.0, 1.0, 1.0, 1.0]).unwrap();
        index.add(id, fresh.clone()).unwrap();

        let hits = index.query(&fresh, 1, 0.0).unwrap();
        assert_eq!(hits[0].0, id);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        // The stale vector must not shadow the fresh one.
        let old_hits = index.query(&old, 10, -1.0).unwrap();
        assert_eq!(old_hits.iter().filter(|(hid, _)| *hid == id).count(), 1);
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut index = default_index();
        let id = Uuid::new_v4();
        index.add(id, normalize(&[1.0, 0.0]).unwrap()).unwrap();
        assert!(matches!(
            index.add(id, normalize(&[0.0, 1.0]).unwrap()),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = default_index();
        index.add(Uuid::new_v4(), normalize(&[1.0, 0.0, 0.0]).unwrap()).unwrap();
        assert!(index.add(Uuid::new_v4(), normalize(&[1.0, 0.0]).unwrap()).is_err());
        assert!(index.query(&[1.0, 0.0], 1, 0.0).is_err());
    }

    #[test]
    fn test_leaf_split_on_overflow() {
        let mut index = VpTreeIndex::new(2, DEFAULT_SEED);
        let points = random_points(55, 9, 4);
        for (id, v) in points.clone() {
            index.add(id, v).unwrap();
        }
        assert!(matches!(index.root, Node::Inner { .. }));
        for (id, v) in &points {
            assert_eq!(index.query(v, 1, 0.0).unwrap()[0].0, *id);
        }
    }

    #[test]
    fn test_identical_points_degenerate() {
        // All points collinear: every distance to the vantage is zero.
        let mut index = VpTreeIndex::new(2, DEFAULT_SEED);
        let v = normalize(&[1.0, 1.0]).unwrap();
        let mut ids: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
        ids.sort();
        for id in &ids {
            index.add(*id, v.clone()).unwrap();
        }
        let hits = index.query(&v, 3, 0.0).unwrap();
        assert_eq!(hits.len(), 3);
        // Ties broken by ascending id.
        assert_eq!(
            hits.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            ids[..3].to_vec()
        );
    }
}
